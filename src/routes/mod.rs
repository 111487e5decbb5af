/// Router Module Index
///
/// Splits the API into access tiers. Access control is attached per tier in
/// `create_router` (as route layers), never inside individual handlers.

/// Routes open to everyone. Some of them personalize their answer when a valid token is
/// sent (`MaybeAuthUser`).
pub mod public;

/// Routes behind the `AuthUser` extractor middleware.
pub mod authenticated;

/// Catalogue management, restricted to the 'admin' role by `require_admin`.
pub mod admin;
