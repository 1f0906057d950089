use uuid::Uuid;

use super::{deleted, Database};
use crate::errors::FleetError;
use crate::models::route::{
    Position, PositionRequest, Route, RoutePosition, RoutePositionRequest, RouteRequest,
};
use crate::validation::ValidationError;

const SELECT_ROUTE_POSITIONS: &str = r#"SELECT rp.id, rp.route_id, rp.position_id, rp."order",
        rp.alias, rp.distance, rp.estimated_time, p.name, p.lat, p.lng
    FROM route_positions rp
    JOIN positions p ON p.id = rp.position_id"#;

impl Database {
    pub async fn list_positions(&self) -> Result<Vec<Position>, FleetError> {
        let positions = sqlx::query_as::<_, Position>("SELECT * FROM positions ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(positions)
    }

    pub async fn get_position(&self, id: i64) -> Result<Position, FleetError> {
        sqlx::query_as::<_, Position>("SELECT * FROM positions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Position", id))
    }

    pub async fn create_position(&self, request: &PositionRequest) -> Result<Position, FleetError> {
        let (lat, lng) = request.rounded();
        let position = sqlx::query_as::<_, Position>(
            "INSERT INTO positions (name, lat, lng) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(request.name.trim())
        .bind(lat)
        .bind(lng)
        .fetch_one(&self.pool)
        .await?;
        Ok(position)
    }

    /// Update a position
    ///
    /// Routes using the position are locked, and the update is refused when
    /// one of them already stops at the new coordinates.
    pub async fn update_position(
        &self,
        id: i64,
        request: &PositionRequest,
    ) -> Result<Position, FleetError> {
        let (lat, lng) = request.rounded();
        let mut tx = self.pool.begin().await?;

        // Routes before the position, in the same order as add_route_position
        sqlx::query(
            "SELECT id FROM routes
             WHERE id IN (SELECT route_id FROM route_positions WHERE position_id = $1)
             ORDER BY id
             FOR UPDATE",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM positions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(FleetError::not_found("Position", id));
        }

        let coordinates_taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM route_positions rp
                JOIN positions p ON p.id = rp.position_id
                WHERE rp.position_id <> $1 AND p.lat = $2 AND p.lng = $3
                  AND rp.route_id IN (
                      SELECT route_id FROM route_positions WHERE position_id = $1
                  )
            )",
        )
        .bind(id)
        .bind(lat)
        .bind(lng)
        .fetch_one(&mut *tx)
        .await?;
        if coordinates_taken {
            return Err(ValidationError::DuplicateRoutePosition.into());
        }

        let position = sqlx::query_as::<_, Position>(
            "UPDATE positions SET name = $2, lat = $3, lng = $4 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(request.name.trim())
        .bind(lat)
        .bind(lng)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(position)
    }

    /// Delete a position, refused while a route uses it
    pub async fn delete_position(&self, id: i64) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM positions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Position", id)
    }

    /// Routes, optionally only those named exactly `name`
    pub async fn list_routes(&self, name: Option<&str>) -> Result<Vec<Route>, FleetError> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let routes = sqlx::query_as::<_, Route>(
            "SELECT * FROM routes
             WHERE $1::TEXT IS NULL OR name = $1
             ORDER BY name, id",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(routes)
    }

    pub async fn get_route(&self, id: i64) -> Result<Route, FleetError> {
        sqlx::query_as::<_, Route>("SELECT * FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Route", id))
    }

    pub async fn create_route(&self, request: &RouteRequest) -> Result<Route, FleetError> {
        let route = sqlx::query_as::<_, Route>(
            "INSERT INTO routes (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(request.name.trim())
        .bind(&request.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(route)
    }

    pub async fn update_route(&self, id: i64, request: &RouteRequest) -> Result<Route, FleetError> {
        sqlx::query_as::<_, Route>(
            "UPDATE routes SET name = $2, description = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(request.name.trim())
        .bind(&request.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FleetError::not_found("Route", id))
    }

    pub async fn delete_route(&self, id: i64) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Route", id)
    }

    /// Positions of a route in order
    pub async fn route_positions(&self, route: i64) -> Result<Vec<RoutePosition>, FleetError> {
        self.get_route(route).await?;
        let positions = sqlx::query_as::<_, RoutePosition>(&format!(
            r#"{SELECT_ROUTE_POSITIONS} WHERE rp.route_id = $1 ORDER BY rp."order""#
        ))
        .bind(route)
        .fetch_all(&self.pool)
        .await?;
        Ok(positions)
    }

    /// Append a position to a route
    ///
    /// The order and the coordinates of the position must both be new to
    /// the route. The route row is locked so concurrent additions to the
    /// same route are checked one after the other.
    pub async fn add_route_position(
        &self,
        route: i64,
        request: &RoutePositionRequest,
    ) -> Result<RoutePosition, FleetError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM routes WHERE id = $1 FOR UPDATE")
                .bind(route)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(FleetError::not_found("Route", route));
        }

        let coordinates: Option<(f64, f64)> =
            sqlx::query_as("SELECT lat, lng FROM positions WHERE id = $1 FOR SHARE")
                .bind(request.position_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((lat, lng)) = coordinates else {
            return Err(FleetError::Reference(format!(
                "position {} does not exist",
                request.position_id
            )));
        };

        let order_taken: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM route_positions WHERE route_id = $1 AND "order" = $2)"#,
        )
        .bind(route)
        .bind(request.order)
        .fetch_one(&mut *tx)
        .await?;
        if order_taken {
            return Err(ValidationError::DuplicateRouteOrder.into());
        }

        let coordinates_taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM route_positions rp
                JOIN positions p ON p.id = rp.position_id
                WHERE rp.route_id = $1 AND p.lat = $2 AND p.lng = $3
            )",
        )
        .bind(route)
        .bind(lat)
        .bind(lng)
        .fetch_one(&mut *tx)
        .await?;
        if coordinates_taken {
            return Err(ValidationError::DuplicateRoutePosition.into());
        }

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO route_positions (route_id, position_id, "order", alias, distance,
               estimated_time)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(route)
        .bind(request.position_id)
        .bind(request.order)
        .bind(request.alias.as_deref())
        .bind(request.distance)
        .bind(request.estimated_time)
        .fetch_one(&mut *tx)
        .await?;

        let created = sqlx::query_as::<_, RoutePosition>(&format!(
            "{SELECT_ROUTE_POSITIONS} WHERE rp.id = $1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Remove a stop from a route
    pub async fn delete_route_position(&self, route: i64, id: i64) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM route_positions WHERE id = $1 AND route_id = $2")
            .bind(id)
            .bind(route)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Route position", id)
    }

    pub async fn user_routes(&self, user: Uuid) -> Result<Vec<Route>, FleetError> {
        self.get_user(user).await?;
        let routes = sqlx::query_as::<_, Route>(
            "SELECT r.* FROM routes r
             JOIN user_routes ur ON ur.route_id = r.id
             WHERE ur.user_uuid = $1
             ORDER BY r.name, r.id",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(routes)
    }

    /// Assign a route to a user, a no-op if already assigned
    pub async fn link_user_route(&self, user: Uuid, route: i64) -> Result<Route, FleetError> {
        self.get_user(user).await?;
        let linked = self.get_route(route).await?;
        sqlx::query(
            "INSERT INTO user_routes (user_uuid, route_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user)
        .bind(route)
        .execute(&self.pool)
        .await?;
        Ok(linked)
    }
}
