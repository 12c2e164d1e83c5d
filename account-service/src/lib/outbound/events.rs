pub mod queue;
pub mod worker;

pub use queue::ChannelEventPublisher;
pub use worker::spawn_email_verification_worker;
pub use worker::EmailVerificationWorker;
