//! IdGenerator port - ID 生成の抽象化

use ulid::Ulid;

use crate::domain::BatchId;
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_batch_id(&self) -> BatchId;
}

/// ULID generator whose timestamp part comes from a `Clock`.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_batch_id(&self) -> BatchId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        BatchId::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
