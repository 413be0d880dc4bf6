//! Process exit codes and the policy for folding many of them into one.

use std::fmt;

/// Exit code of a process or of the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Map an `ExitStatus::code()` value; a process killed by a signal has no code and counts as failure.
    pub fn from_status_code(code: Option<i32>) -> Self {
        code.map(ExitCode).unwrap_or(ExitCode::FAILURE)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reduce a sequence of exit codes to a single status.
///
/// ## Returns
/// - [`ExitCode::SUCCESS`] when every code succeeded (including the empty sequence).
/// - Otherwise the first non-success code, in iteration order.
///
/// ## Examples
/// ```rust
/// use pubtest_core::exit::{reduce, ExitCode};
///
/// assert_eq!(reduce([ExitCode(0), ExitCode(3), ExitCode(1)]), ExitCode(3));
/// assert_eq!(reduce([ExitCode(0), ExitCode(0)]), ExitCode::SUCCESS);
/// ```
pub fn reduce<I>(codes: I) -> ExitCode
where
    I: IntoIterator<Item = ExitCode>,
{
    codes
        .into_iter()
        .find(|code| !code.is_success())
        .unwrap_or(ExitCode::SUCCESS)
}
