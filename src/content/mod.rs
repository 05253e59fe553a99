//!
//! Content backend
//! ---------------
//! Thin client for the headless CMS (Strapi) that supplies services and tags.
//! Read queries never fail towards the pages: transport, status and GraphQL errors are
//! logged and surface as `None` or an empty list. Only sign-in propagates errors.

mod model;
mod strapi;
mod video;

pub use model::{ServiceRecord, Tag, StrapiAuth};
pub use strapi::{StrapiClient, ContentConfig, ExecutionContext, ContentError, DEFAULT_PUBLIC_URL};
pub use video::embed_url;
