pub mod engagement;
pub mod error;
pub mod petition;
pub mod resolver;
pub mod service;
pub mod share;
pub mod signature;
pub mod stats;
pub mod store;
pub mod story;

pub use engagement::EngagementService;
pub use error::{Error, Result};
pub use petition::{Petition, PetitionId};
pub use resolver::PetitionResolver;
pub use service::SignatureService;
pub use share::{NewSocialShare, SocialShare};
pub use signature::{EmailFingerprint, Signature, SignatureReceipt, SignatureRequest};
pub use stats::{aggregate, PetitionStats, PlatformStats};
pub use store::{DualStore, DurableStatus, MemoryStore, PgStore, Store, StoreError, StoreResult};
pub use story::{NewStory, Story};
