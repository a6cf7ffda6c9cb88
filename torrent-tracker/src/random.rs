use rand::Rng;

/// Supplies the 32-bit transaction ids used to correlate UDP tracker replies.
///
/// Every call must return a fresh draw; implementations are shared between
/// concurrent announces.
pub trait TransactionIdSource: Send + Sync {
    fn next_transaction_id(&self) -> u32;
}

/// Draws from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl TransactionIdSource for ThreadRngSource {
    fn next_transaction_id(&self) -> u32 {
        rand::rng().random()
    }
}
