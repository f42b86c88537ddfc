mod otp_code;
mod subscriber_email;
mod topic;

pub use otp_code::OtpCode;
pub use subscriber_email::SubscriberEmail;
pub use topic::Topic;
