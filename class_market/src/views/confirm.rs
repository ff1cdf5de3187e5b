//! Confirmation before destructive actions.

/// Asks the user to confirm an action.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// A decision the user already made (a `--yes` flag, a second keypress).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decided(pub bool);

impl Confirm for Decided {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
