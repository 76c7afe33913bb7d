//! Typed hint values for the resolution context.
//!
//! Each hint is its own newtype so it occupies its own slot in the
//! type-keyed [`ResolveContext`]; rules look hints up by type.

use certis_core::models::ProviderHints;
use certis_core::{OrgModule, ProviderType};
use certis_resolve::ResolveContext;

/// The caller's resolved organization ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationIdValue(pub String);

/// The caller's subject ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectIdValue(pub String);

/// Module the upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleHint(pub OrgModule);

/// Provider the caller prefers, honored when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferredProviderHint(pub ProviderType);

/// Provider the object is already known to live at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownProviderHint(pub ProviderType);

/// Payload size in bytes, when known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeBytesHint(pub i64);

/// Inject hint values into the resolution context.
pub fn apply_provider_hints(ctx: &mut ResolveContext, hints: &ProviderHints) {
    if let Some(module) = hints.resolve_module() {
        ctx.insert(ModuleHint(module));
    }

    if let Some(preferred) = hints.preferred_provider {
        ctx.insert(PreferredProviderHint(preferred));
    }

    if let Some(known) = hints.known_provider {
        ctx.insert(KnownProviderHint(known));
    }

    if let Some(size) = hints
        .metadata
        .get("size_bytes")
        .and_then(|raw| raw.parse::<i64>().ok())
    {
        ctx.insert(SizeBytesHint(size));
    }
}
