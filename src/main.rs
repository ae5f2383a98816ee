use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vehicle_rental::build_router;
use vehicle_rental::config::database::mask_database_url;
use vehicle_rental::config::{DatabaseConfig, EnvironmentConfig};
use vehicle_rental::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging (RUST_LOG, por defecto info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚗 Vehicle Rental Marketplace API");
    info!("================================");

    let config = EnvironmentConfig::from_env().map_err(|e| {
        error!("❌ Configuración inválida: {}", e);
        anyhow::anyhow!("Error de configuración: {}", e)
    })?;

    // Inicializar base de datos
    info!("🗄️ Conectando a {}", mask_database_url(&config.database_url));
    let pool = match DatabaseConfig::new(config.database_url.clone()).create_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };
    info!("✅ Base de datos conectada");

    let addr: SocketAddr = config.server_url().parse()?;
    let development = config.is_development();
    let app = build_router(AppState::new(pool, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    if development {
        info!("🧪 Modo desarrollo");
    }
    info!("🔍 Endpoints disponibles:");
    info!("   GET    /health - Estado del servicio");
    info!("🚘 Posts:");
    info!("   GET    /api/posts - Listado con filtros, orden y paginación");
    info!("   GET    /api/posts/:id - Detalle (suma una vista)");
    info!("   GET    /api/posts/agency/:agency_id - Posts de una agencia");
    info!("   POST   /api/posts - Crear post");
    info!("   PUT    /api/posts/:id - Actualizar post");
    info!("   DELETE /api/posts/:id - Eliminar post");
    info!("⭐ Reviews:");
    info!("   POST   /api/posts/:id/reviews - Comentar y valorar");
    info!("   PUT    /api/reviews/:id - Editar comentario");
    info!("   DELETE /api/reviews/:id - Borrar comentario");
    info!("📅 Reservas:");
    info!("   POST   /api/reservations - Crear reserva");
    info!("   GET    /api/reservations - Mis reservas");
    info!("   GET    /api/reservations/:id - Detalle de reserva");
    info!("💳 Pagos:");
    info!("   GET    /api/payments - Mis pagos (paginado)");
    info!("   POST   /api/payments - Registrar pago");
    info!("   GET    /api/payments/agency - Pagos de mi agencia");
    info!("   GET    /api/payments/:id - Detalle de pago");
    info!("   PATCH  /api/payments/:id/status - Actualizar estado");
    info!("   DELETE /api/payments/:id - Eliminar pago");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo escuchar SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
