use rand::rngs::OsRng;
use rand::Rng;

/// Number of digits in a one-time password
pub const OTP_LENGTH: usize = 6;

/// A six-digit one-time password, either freshly generated or parsed from
/// user input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Generate a random code from the OS entropy source. The first digit is
    /// never zero, so the code survives being displayed as a number.
    pub fn generate() -> Self {
        let n: u32 = OsRng.gen_range(100_000..1_000_000);
        Self(n.to_string())
    }

    pub fn parse(code: String) -> Result<Self, String> {
        let code = code.trim().to_string();
        if code.len() == OTP_LENGTH && code.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(code))
        } else {
            Err(format!("A verification code must be {OTP_LENGTH} digits"))
        }
    }
}

impl AsRef<str> for OtpCode {
    fn as_ref(&self) -> &str { &self.0 }
}
