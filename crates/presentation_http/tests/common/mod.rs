//! Shared helpers for the integration suites
//!
//! Every test runs a real server on its own ephemeral port and talks to it
//! over the wire client, exactly the way an embedding test suite would.

use domain::requests::CreateTableInput;
use domain::table::{
    AttributeDefinition, KeySchemaElement, KeyType, ProvisionedThroughput, ScalarAttributeType,
};
use domain::{AttributeValue, Item};
use presentation_http::{MimicServer, WireClient};

pub struct TestContext {
    pub server: MimicServer,
    pub client: WireClient,
}

pub async fn start_server() -> TestContext {
    let mut server = MimicServer::new().expect("failed to allocate a port");
    server.start().await.expect("failed to start the server");
    let client = WireClient::new(server.endpoint());
    TestContext { server, client }
}

pub fn create_table_input(table_name: &str, hash_key: &str) -> CreateTableInput {
    CreateTableInput {
        table_name: table_name.to_string(),
        attribute_definitions: vec![AttributeDefinition {
            attribute_name: hash_key.to_string(),
            attribute_type: ScalarAttributeType::S,
        }],
        key_schema: vec![KeySchemaElement {
            attribute_name: hash_key.to_string(),
            key_type: KeyType::Hash,
        }],
        provisioned_throughput: Some(ProvisionedThroughput {
            read_capacity_units: 10,
            write_capacity_units: 10,
        }),
        stream_specification: None,
    }
}

pub fn string_item(pairs: &[(&str, &str)]) -> Item {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), AttributeValue::S((*value).to_string())))
        .collect()
}
