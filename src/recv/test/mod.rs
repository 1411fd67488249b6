
mod state_body;

use crate::{HttpState, ResponseContext};

/// Feed `input` in pieces of at most `step` bytes until the context stops
/// consuming, proceeding automatically through interim heads. Returns the
/// total number of bytes consumed.
pub fn drive(ctx: &mut ResponseContext, mut input: &[u8], step: usize) -> usize {
    let mut consumed = 0;

    while !input.is_empty() {
        let take = step.min(input.len());
        let n = ctx.feed(&input[..take]);
        input = &input[n..];
        consumed += n;

        if n < take {
            if ctx.state() == HttpState::OneHundredContinue {
                assert!(ctx.proceed_after_interim());
                continue;
            }
            // Stopped at a message boundary (or failed).
            break;
        }
    }

    consumed
}
