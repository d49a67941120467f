use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pro_fleet::config::{DatabaseConfig, EnvironmentConfig};
use pro_fleet::database::DatabaseConnection;
use pro_fleet::services::scheduler::spawn_sweeper;
use pro_fleet::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,pro_fleet=debug")),
        )
        .init();

    info!("🚚 PRO FLEET - Logística de cadena de frío");
    info!("==========================================");

    let config = EnvironmentConfig::from_env().context("configuración inválida")?;
    info!("⚙️ Entorno: {}", config.environment);

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::connect(&DatabaseConfig::new(&config.database_url)).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };
    let pool = db_connection.pool().clone();

    let sweeper = spawn_sweeper(pool.clone(), config.policy.overdue_sweep_interval_secs);
    info!(
        "🧹 Barrido de vencimientos cada {} s",
        config.policy.overdue_sweep_interval_secs
    );

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("dirección inválida: {}", config.server_url()))?;

    let app_state = AppState::new(pool, config)?;
    let app = create_router(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Grupos de endpoints:");
    info!("   /api/auth       - registro, login, perfil");
    info!("   /api/admin      - usuarios, catálogo, tarifas, viajes, panel");
    info!("   /api/customer   - reservas, facturas, panel");
    info!("   /api/driver     - viajes asignados y disponibles, panel");
    info!("   /api/accountant - facturación y cobros");
    info!("   /api/customs    - despachos y documentos");
    info!("   /api/tracking   - posiciones GPS");
    info!("   /api/catalog    - datos de referencia y cotizaciones");
    info!("   GET /health, GET /metrics");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
    }

    sweeper.abort();
    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de SIGTERM: {}", e);
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
            info!("🛑 Señal SIGTERM recibida, apagando servidor...");
        },
    }
}
