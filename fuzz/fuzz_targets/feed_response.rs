#![no_main]

use backhaul::{HttpState, ResponseContext};
use http::Method;
use libfuzzer_sys::fuzz_target;

// Whatever bytes the backend sends, interpreting them must not depend on
// how they were fragmented.
fuzz_target!(|data: &[u8]| {
    let mut whole = ResponseContext::new(Method::GET, false);
    let a = run(&mut whole, data, data.len().max(1));

    let mut bytewise = ResponseContext::new(Method::GET, false);
    let b = run(&mut bytewise, data, 1);

    assert_eq!(whole.state(), bytewise.state());
    assert_eq!(whole.error(), bytewise.error());
    assert_eq!(whole.status(), bytewise.status());
    assert_eq!(whole.version(), bytewise.version());

    // Progress counters are only comparable when nothing went wrong; a
    // violation aborts whatever a single call had in flight.
    if whole.error().is_none() {
        assert_eq!(a, b);
        assert_eq!(whole.body_mode(), bytewise.body_mode());
        assert_eq!(whole.body_already_read(), bytewise.body_already_read());
        assert_eq!(whole.is_body_complete(), bytewise.is_body_complete());
        assert_eq!(whole.want_keep_alive(), bytewise.want_keep_alive());
        assert_eq!(whole.can_reuse_connection(), bytewise.can_reuse_connection());
    }
});

fn run(ctx: &mut ResponseContext, mut input: &[u8], step: usize) -> usize {
    let mut consumed = 0;

    while !input.is_empty() {
        let take = step.min(input.len());
        let n = ctx.feed(&input[..take]);
        input = &input[n..];
        consumed += n;

        if n < take {
            if ctx.state() == HttpState::OneHundredContinue {
                ctx.proceed_after_interim();
                continue;
            }
            break;
        }
    }

    consumed
}
