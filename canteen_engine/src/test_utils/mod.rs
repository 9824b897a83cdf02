pub mod prepare_env;
pub mod test_gateway;

pub use test_gateway::TestGateway;
