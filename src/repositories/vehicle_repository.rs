use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::Vehicle;
use crate::utils::errors::AppError;

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    /// Carga en bloque los vehículos de una página de posts
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Vehicle>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let vehicles = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(vehicles)
    }
}

pub(crate) const LOCK_VEHICLE_SQL: &str = "SELECT * FROM vehicles WHERE id = $1 FOR UPDATE";

/// Bloquea el vehículo para el resto de la transacción. Borrar su post y
/// crearle una reserva pasan por aquí, así que nunca se solapan.
pub async fn lock_vehicle(conn: &mut PgConnection, id: Uuid) -> Result<Option<Vehicle>, AppError> {
    let vehicle = sqlx::query_as::<_, Vehicle>(LOCK_VEHICLE_SQL)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(vehicle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_lock_is_a_row_lock() {
        assert!(LOCK_VEHICLE_SQL.starts_with("SELECT * FROM vehicles WHERE id = $1"));
        assert!(LOCK_VEHICLE_SQL.ends_with("FOR UPDATE"));
    }
}
