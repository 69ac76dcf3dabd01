pub mod credentials;
pub mod release;
pub mod rollout;
pub mod service_account;
pub mod token;

pub use credentials::{ResolvedCredentials, TokenSource, resolve_credentials};
pub use release::{ReleaseRequest, run_release};
pub use rollout::{PromoteRequest, RolloutAction, RolloutRequest, run_promote, run_rollout};
pub use token::{StoredToken, TokenManager};
