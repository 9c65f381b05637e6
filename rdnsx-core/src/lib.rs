//! rdnsx-core: the bulk DNS resolution and wildcard-detection pipeline (§3, §4).
//!
//! Built around two cooperating pieces: the mass-resolve pipeline driven by
//! an external resolver binary (`massdns`, `workspace`, `domain_source`,
//! `cache_reader`), and the concurrent wildcard-detection engine that
//! classifies the survivors (`wildcard`, `cache`, `resolver_client`). The
//! [`orchestrator`] module sequences both into one end-to-end run.

pub mod cache;
pub mod cache_reader;
pub mod config;
pub mod console;
pub mod domain_source;
pub mod error;
pub mod hashing;
pub mod massdns;
pub mod orchestrator;
pub mod resolver_client;
pub mod sanitize;
pub mod wildcard;
pub mod workspace;

pub use cache::{AnswerCache, DnsCache};
pub use cache_reader::CacheReader;
pub use config::{qps_per_resolver, Mode, ResolveOptions, DEFAULT_TRUSTED_RESOLVERS};
pub use console::{Console, Level};
pub use domain_source::DomainSource;
pub use error::{PipelineError, Result, Stage};
pub use hashing::{hash_question, AnswerHash, DnsAnswer, QuestionHash, RecordType};
pub use massdns::{check_binary, LineRateGovernor, MassResolver};
pub use orchestrator::{Orchestrator, RunResult};
pub use resolver_client::{HickoryResolverClient, ResolverClient};
pub use sanitize::sanitize;
pub use wildcard::{FilterResult, Wildcarder};
pub use workspace::Workspace;
