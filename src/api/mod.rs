pub mod argocd_cluster;
pub mod connection_config;
