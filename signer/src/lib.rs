//! Outbound TSS batch keysign.
//!
//! Outbound digests are registered per nonce as they are built. Nonces are
//! grouped into fixed windows of [`BATCH_SIZE`]; a window is signed in one TSS
//! round once every pending nonce in it has a digest and the digests form a
//! gapless run. Windows are always signed in order, so every co-signer builds
//! the same batch at the same time.

pub mod batch_sign;
pub mod error;
pub mod height;
pub mod keysign;
pub mod schedule;

pub use batch_sign::{BatchSigner, BatchSignerConfig, BatchStatus};
pub use error::{NotReady, SignerError};
pub use height::{keysign_height, MAX_PAIRING_INPUT};
pub use keysign::{batch_number_to_range, nonce_to_batch_number, KeysignBatch, KeysignInfo, BATCH_SIZE};
pub use schedule::{check_block_event, is_time_to_keysign, keysign_delay};
