use std::env;

use serde::de::DeserializeOwned;
use serde_json::json;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use uuid::Uuid;

use fleet_api::{
    database::Database,
    errors::FleetError,
    geocoding::DisabledGeocoder,
    ingest::{AlarmIngestor, EnrichmentSettings, Ingestion},
    models::{
        alarm::NewAlarm,
        device::DeviceRequest,
        movement::{ClosureRequest, MovementOrderRequest, MovementOrderStateRequest},
        route::{PositionRequest, RoutePositionRequest, RouteRequest},
        user::{User, UserRequest},
        vehicle::{MileageRequest, Vehicle, VehicleRequest, VehicleTypeRequest},
    },
    validation::ValidationError,
};

async fn setup_test_db() -> Pool<Postgres> {
    dotenvy::dotenv().ok();
    let database_url =
        env::var("DATABASE_URL").expect("Environment variable DATABASE_URL required");

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database")
}

fn request<T: DeserializeOwned>(value: serde_json::Value) -> T {
    serde_json::from_value(value).expect("Invalid request fixture")
}

/// Fifteen digit IMEI unique to a test run
fn unique_imei() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000_000_000_000;
    format!("{n:015}")
}

async fn register_device(db: &Database, imei: &str) {
    let device: DeviceRequest = request(json!({
        "imei": imei,
        "user_name": "Tracker",
        "is_tracking_alarms": true,
    }));
    db.upsert_device(&device).await.expect("Failed to register device");
}

async fn create_user(db: &Database, name: &str) -> User {
    let user: UserRequest = request(json!({
        "username": format!("{name}-{}", Uuid::new_v4()),
        "roles": ["Driver"],
    }));
    db.create_user(&user).await.expect("Failed to create user")
}

async fn create_vehicle(db: &Database) -> Vehicle {
    let vehicle_type: VehicleTypeRequest = request(json!({
        "year": 2020,
        "brand": "Toyota",
        "model": "Hilux",
    }));
    let vehicle_type = db.create_vehicle_type(&vehicle_type).await.unwrap();
    let vehicle: VehicleRequest = request(json!({ "vehicle_type_id": vehicle_type.id }));
    db.create_vehicle(&vehicle).await.expect("Failed to create vehicle")
}

fn alarm(imei: &str, time: i64) -> NewAlarm {
    request(json!({
        "device_imei": imei,
        "lat": -0.180653,
        "lng": -78.467834,
        "time": time,
        "address": "Av. Amazonas",
        "alarm_code": "SOS",
        "alarm_type": 1,
        "device_type": 1,
    }))
}

#[ignore = "requires a PostgreSQL DATABASE_URL"]
#[sqlx::test]
async fn test_duplicate_alarm_is_already_reported() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let imei = unique_imei();
    register_device(&db, &imei).await;

    let ingestor = AlarmIngestor::new(&db, &DisabledGeocoder, EnrichmentSettings::default());
    let first = ingestor.ingest(alarm(&imei, 1_700_000_000), 1_700_000_010).await.unwrap();
    let second = ingestor.ingest(alarm(&imei, 1_700_000_000), 1_700_000_020).await.unwrap();

    assert!(matches!(first, Ingestion::Created(_)));
    assert!(matches!(second, Ingestion::AlreadyReported(_)));
    assert_eq!(first.alarm().id, second.alarm().id);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alarms WHERE device_imei = $1")
        .bind(&imei)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[ignore = "requires a PostgreSQL DATABASE_URL"]
#[sqlx::test]
async fn test_alarm_for_unregistered_device() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let ingestor = AlarmIngestor::new(&db, &DisabledGeocoder, EnrichmentSettings::default());

    let result = ingestor.ingest(alarm(&unique_imei(), 1_700_000_000), 1_700_000_010).await;
    assert!(matches!(result, Err(FleetError::NotFound { entity: "Device", .. })));
}

#[ignore = "requires a PostgreSQL DATABASE_URL"]
#[sqlx::test]
async fn test_nearby_address_is_reused() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let imei = unique_imei();
    register_device(&db, &imei).await;
    let ingestor = AlarmIngestor::new(&db, &DisabledGeocoder, EnrichmentSettings::default());

    ingestor.ingest(alarm(&imei, 1_700_000_000), 1_700_000_000).await.unwrap();

    let mut nearby = alarm(&imei, 1_700_000_100);
    nearby.address = None;
    nearby.lat = Some(-0.180660);
    let stored = ingestor.ingest(nearby, 1_700_000_100).await.unwrap();
    assert_eq!(stored.alarm().address.as_deref(), Some("Av. Amazonas"));
}

#[ignore = "requires a PostgreSQL DATABASE_URL"]
#[sqlx::test]
async fn test_referenced_device_cannot_be_deleted() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let imei = unique_imei();
    register_device(&db, &imei).await;
    let ingestor = AlarmIngestor::new(&db, &DisabledGeocoder, EnrichmentSettings::default());
    ingestor.ingest(alarm(&imei, 1_700_000_000), 1_700_000_000).await.unwrap();

    let result = db.delete_device(&imei).await;
    assert!(matches!(result, Err(FleetError::Conflict(_))));

    let result = db.delete_device(&unique_imei()).await;
    assert!(matches!(result, Err(FleetError::NotFound { .. })));
}

#[ignore = "requires a PostgreSQL DATABASE_URL"]
#[sqlx::test]
async fn test_route_rejects_duplicate_positions() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let route: RouteRequest = request(json!({ "name": format!("Route {}", Uuid::new_v4()) }));
    let route = db.create_route(&route).await.unwrap();

    let depot: PositionRequest =
        request(json!({ "name": "Depot", "lat": -2.170998, "lng": -79.922359 }));
    let depot = db.create_position(&depot).await.unwrap();
    let same_place: PositionRequest =
        request(json!({ "name": "Depot gate", "lat": -2.17099800001, "lng": -79.922359 }));
    let same_place = db.create_position(&same_place).await.unwrap();
    let market: PositionRequest = request(json!({ "name": "Market", "lat": -2.19, "lng": -79.88 }));
    let market = db.create_position(&market).await.unwrap();

    let first: RoutePositionRequest = request(json!({ "position_id": depot.id, "order": 1 }));
    db.add_route_position(route.id, &first).await.unwrap();

    let same_order: RoutePositionRequest = request(json!({ "position_id": market.id, "order": 1 }));
    let result = db.add_route_position(route.id, &same_order).await;
    assert!(matches!(
        result,
        Err(FleetError::Validation(ValidationError::DuplicateRouteOrder))
    ));

    let same_coordinates: RoutePositionRequest =
        request(json!({ "position_id": same_place.id, "order": 2 }));
    let result = db.add_route_position(route.id, &same_coordinates).await;
    assert!(matches!(
        result,
        Err(FleetError::Validation(ValidationError::DuplicateRoutePosition))
    ));

    let second: RoutePositionRequest = request(json!({ "position_id": market.id, "order": 2 }));
    db.add_route_position(route.id, &second).await.unwrap();

    let positions = db.route_positions(route.id).await.unwrap();
    let orders: Vec<i32> = positions.iter().map(|p| p.order).collect();
    assert_eq!(orders, vec![1, 2]);
    assert_eq!(positions[1].name, "Market");
}

#[ignore = "requires a PostgreSQL DATABASE_URL"]
#[sqlx::test]
async fn test_moving_position_onto_route_stop_is_rejected() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let name = format!("Route {}", Uuid::new_v4());
    let route: RouteRequest = request(json!({ "name": name }));
    let route = db.create_route(&route).await.unwrap();

    let first: PositionRequest = request(json!({ "name": "A", "lat": 1.0, "lng": 1.0 }));
    let first = db.create_position(&first).await.unwrap();
    let second: PositionRequest = request(json!({ "name": "B", "lat": 2.0, "lng": 2.0 }));
    let second = db.create_position(&second).await.unwrap();

    for (position, order) in [(first.id, 1), (second.id, 2)] {
        let stop: RoutePositionRequest =
            request(json!({ "position_id": position, "order": order }));
        db.add_route_position(route.id, &stop).await.unwrap();
    }

    let moved: PositionRequest = request(json!({ "name": "B", "lat": 1.0, "lng": 1.0 }));
    let result = db.update_position(second.id, &moved).await;
    assert!(matches!(
        result,
        Err(FleetError::Validation(ValidationError::DuplicateRoutePosition))
    ));

    let coordinates: Vec<(f64, f64)> = db
        .route_positions(route.id)
        .await
        .unwrap()
        .iter()
        .map(|p| (p.lat, p.lng))
        .collect();
    assert_eq!(coordinates, vec![(1.0, 1.0), (2.0, 2.0)]);

    // Elsewhere is fine, and so is the position's own spot
    let moved: PositionRequest = request(json!({ "name": "B2", "lat": 3.0, "lng": 3.0 }));
    let updated = db.update_position(second.id, &moved).await.unwrap();
    assert_eq!((updated.lat, updated.lng), (3.0, 3.0));
    let renamed: PositionRequest = request(json!({ "name": "A2", "lat": 1.0, "lng": 1.0 }));
    db.update_position(first.id, &renamed).await.unwrap();

    let result = db.update_position(i64::MAX, &moved).await;
    assert!(matches!(result, Err(FleetError::NotFound { .. })));
}

#[ignore = "requires a PostgreSQL DATABASE_URL"]
#[sqlx::test]
async fn test_route_stop_removal_and_name_filter() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let name = format!("Route {}", Uuid::new_v4());
    let route: RouteRequest = request(json!({ "name": name }));
    let route = db.create_route(&route).await.unwrap();

    let depot: PositionRequest = request(json!({ "name": "Depot", "lat": 5.0, "lng": 5.0 }));
    let depot = db.create_position(&depot).await.unwrap();
    let stop: RoutePositionRequest = request(json!({ "position_id": depot.id, "order": 1 }));
    let stop = db.add_route_position(route.id, &stop).await.unwrap();

    let result = db.delete_position(depot.id).await;
    assert!(matches!(result, Err(FleetError::Conflict(_))));

    let result = db.delete_route_position(route.id + 1, stop.id).await;
    assert!(matches!(result, Err(FleetError::NotFound { .. })));
    db.delete_route_position(route.id, stop.id).await.unwrap();
    assert!(db.route_positions(route.id).await.unwrap().is_empty());
    db.delete_position(depot.id).await.unwrap();

    let exact = db.list_routes(Some(&name)).await.unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].id, route.id);
    let partial = db.list_routes(Some("Route")).await.unwrap();
    assert!(partial.iter().all(|r| r.id != route.id));
}

#[ignore = "requires a PostgreSQL DATABASE_URL"]
#[sqlx::test]
async fn test_movement_order_lifecycle() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let driver = create_user(&db, "driver").await;
    let manager = create_user(&db, "manager").await;
    let vehicle = create_vehicle(&db).await;
    let route: RouteRequest = request(json!({ "name": format!("Route {}", Uuid::new_v4()) }));
    let route = db.create_route(&route).await.unwrap();

    let mileage: MileageRequest = request(json!({ "mileage": 1200.0, "unit": "km" }));
    let departure = db.add_mileage(vehicle.vuid, &mileage).await.unwrap();

    let order: MovementOrderRequest = request(json!({
        "vehicle_vuid": vehicle.vuid,
        "driver_uuid": driver.uuid,
        "authorized_by": manager.uuid,
        "itinerary_id": route.id,
        "departure_mileage_id": departure.id,
        "departure_details": "Delivery to the northern warehouse",
        "departure_time_unix": 1_700_000_000,
    }));
    let order = db.create_movement_order(&order).await.unwrap();

    for (state, timestamp) in [("Departed", 1_700_000_100), ("In transit", 1_700_000_050)] {
        let state: MovementOrderStateRequest = request(json!({
            "movement_order_id": order.id,
            "state": state,
            "timestamp_unix": timestamp,
            "set_by": driver.uuid,
        }));
        db.add_movement_state(&state).await.unwrap();
    }

    let mileage: MileageRequest = request(json!({ "mileage": 1350.0, "unit": "km" }));
    let arrival = db.add_mileage(vehicle.vuid, &mileage).await.unwrap();
    let closure: ClosureRequest = request(json!({
        "movement_order_id": order.id,
        "verified_by": manager.uuid,
        "arrival_mileage_id": arrival.id,
        "arrival_time_unix": 1_700_003_600,
        "compliance": true,
    }));
    db.close_movement_order(&closure).await.unwrap();

    let result = db.close_movement_order(&closure).await;
    assert!(matches!(result, Err(FleetError::Conflict(_))));

    let timeline = db.movement_order_timeline(order.id).await.unwrap();
    assert!(timeline.closed);
    assert_eq!(timeline.states.len(), 2);
    assert_eq!(timeline.latest_state.as_deref(), Some("Departed"));

    let result = db.delete_vehicle(vehicle.vuid).await;
    assert!(matches!(result, Err(FleetError::Conflict(_))));

    db.delete_movement_order(order.id).await.unwrap();
    let result = db.movement_order_timeline(order.id).await;
    assert!(matches!(result, Err(FleetError::NotFound { .. })));
    let states = db.list_movement_states(Some(order.id)).await.unwrap();
    assert!(states.is_empty());
}

#[ignore = "requires a PostgreSQL DATABASE_URL"]
#[sqlx::test]
async fn test_movement_order_unknown_vehicle() {
    let db = Database::new(setup_test_db().await).await.unwrap();
    let driver = create_user(&db, "driver").await;

    let order: MovementOrderRequest = request(json!({
        "vehicle_vuid": Uuid::new_v4(),
        "driver_uuid": driver.uuid,
        "authorized_by": driver.uuid,
        "itinerary_id": 1,
        "departure_mileage_id": 1,
        "departure_details": "Nowhere",
        "departure_time_unix": 1_700_000_000,
    }));
    let result = db.create_movement_order(&order).await;
    assert!(matches!(result, Err(FleetError::Reference(_))));
}
