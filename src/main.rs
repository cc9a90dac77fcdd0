use inventory_store::handlers::{self, Request, Response};
use inventory_store::{telemetry, DynamoAgent, InventoryStore, StoreConfig};
use serde_json::json;

fn print_response(step: &str, response: &Response) {
    println!("{step}: {} {}", response.status, response.body);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::load()?;
    telemetry::init(config.json_logs);

    let agent = DynamoAgent::connect(&config).await;

    // 1. Create the table and its location index if they do not exist
    if agent.ensure_table().await? {
        println!("Created table {}", config.table_name);
    } else {
        println!("Table {} already exists.", config.table_name);
    }

    let store = InventoryStore::from_config(agent, &config);

    // 2. Insert an item
    let body = json!({
        "name": "Bolt",
        "description": "M6",
        "qty_on_hand": 100,
        "price": 0.25,
        "location_id": 7,
    });
    let created = handlers::create_item(&store, Request::with_body(body.to_string())).await;
    print_response("create", &created);
    let Some(id) = created.body["item"]["id"].as_str().map(str::to_string) else {
        return Err("create did not return an item".into());
    };

    // 3. Fetch it by id and by location
    print_response("get", &handlers::get_item(&store, Request::with_path_id(&id)).await);
    print_response(
        "location",
        &handlers::get_location_items(&store, Request::with_path_id("7")).await,
    );

    // 4. Delete it and confirm it is gone
    print_response("delete", &handlers::delete_item(&store, Request::with_path_id(&id)).await);
    print_response("get", &handlers::get_item(&store, Request::with_path_id(&id)).await);

    Ok(())
}
