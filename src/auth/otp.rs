//! State for the forgot-password flow: a short-lived OTP followed by a
//! single-use password-reset token.
//!
//! Delivery of the OTP is out of scope for this crate, the server logs it for
//! whatever delivery hook is attached to the log output.

use std::time::{Duration, Instant};

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::Error;

/// How long an OTP stays valid after it is issued.
pub const OTP_DURATION: Duration = Duration::from_secs(10 * 60);

/// How long a password-reset token stays valid after OTP verification.
pub const RESET_TOKEN_DURATION: Duration = Duration::from_secs(10 * 60);

struct Challenge {
    value: String,
    issued_at: Instant,
}

impl Challenge {
    fn is_live(&self, now: Instant, duration: Duration) -> bool {
        now.duration_since(self.issued_at) < duration
    }
}

/// The in-process state of the forgot-password flow.
///
/// The app serves a single admin, so one pending OTP and one pending reset
/// token are enough. Issuing a new OTP invalidates the previous one.
#[derive(Default)]
pub struct PasswordResetState {
    otp: Option<Challenge>,
    reset_token: Option<Challenge>,
}

impl PasswordResetState {
    /// Create a state with no pending OTP or reset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh six digit OTP, replacing any pending one.
    pub fn issue_otp(&mut self) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32));

        self.otp = Some(Challenge {
            value: code.clone(),
            issued_at: Instant::now(),
        });
        self.reset_token = None;

        code
    }

    /// Exchange a correct, unexpired OTP for a single-use reset token.
    ///
    /// # Errors
    /// Returns [Error::InvalidOtp] if no OTP is pending, the code is wrong,
    /// or the OTP has expired. The pending OTP is consumed either way except
    /// for a plain wrong code, so the caller can retry a typo.
    pub fn verify_otp(&mut self, code: &str) -> Result<String, Error> {
        let challenge = self.otp.as_ref().ok_or(Error::InvalidOtp)?;

        if !challenge.is_live(Instant::now(), OTP_DURATION) {
            self.otp = None;
            return Err(Error::InvalidOtp);
        }

        if challenge.value != code {
            return Err(Error::InvalidOtp);
        }

        self.otp = None;

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        self.reset_token = Some(Challenge {
            value: token.clone(),
            issued_at: Instant::now(),
        });

        Ok(token)
    }

    /// Consume a reset token, allowing the password to be changed once.
    ///
    /// # Errors
    /// Returns [Error::InvalidResetToken] if no token is pending, the token
    /// does not match, or it has expired.
    pub fn consume_reset_token(&mut self, token: &str) -> Result<(), Error> {
        let challenge = self.reset_token.as_ref().ok_or(Error::InvalidResetToken)?;

        if !challenge.is_live(Instant::now(), RESET_TOKEN_DURATION) {
            self.reset_token = None;
            return Err(Error::InvalidResetToken);
        }

        if challenge.value != token {
            return Err(Error::InvalidResetToken);
        }

        self.reset_token = None;
        Ok(())
    }
}
