pub mod spatial_identity_resolver;
