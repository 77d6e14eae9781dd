

use std::env;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use creator_bot_backend::{
    api,
    core::gate::CreditGate,
    core::generation::{GenerationService, GenerationSettings},
    infrastructure::provider::ApiFreeClient,
    infrastructure::storage::Storage,
    infrastructure::telegram::TelegramApi,
    utils::config::Config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialisation du logging
    setup_tracing();
    info!("🚀 Démarrage du backend Creator Bot");

    // Chargement de la configuration
    let config = Config::from_env().expect("❌ Impossible de charger la configuration");
    info!("✅ Configuration chargée (mode: {})", config.run_mode);

    // Initialisation des services
    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .expect("❌ Impossible de créer le répertoire de la base");
        }
    }
    let storage = Storage::connect(&config.db_path)
        .await
        .expect("❌ Impossible d'ouvrir la base SQLite");
    storage
        .init()
        .await
        .expect("❌ Impossible d'initialiser le schéma");

    let provider = Arc::new(
        ApiFreeClient::new(
            &config.provider_base_url,
            &config.provider_api_key,
            config.provider_timeout(),
        )
        .expect("❌ Impossible d'initialiser le client ApiFree"),
    );
    let telegram =
        TelegramApi::new(&config.bot_token).expect("❌ Impossible d'initialiser le client Telegram");

    let gate = CreditGate::new(storage.clone(), config.admin_id_set());
    let generation =
        GenerationService::new(provider, gate, GenerationSettings::from_config(&config));

    // Enregistrement du webhook Telegram; un échec n'empêche pas le
    // démarrage (le mini-app reste utilisable sans bot)
    let webhook_url = config.webhook_url();
    match telegram.set_webhook(&webhook_url).await {
        Ok(()) => info!("✅ setWebhook -> {}", webhook_url),
        Err(e) => warn!("⚠️ setWebhook échoué: {}", e),
    }

    // Données partagées de l'application
    let config_data = web::Data::new(config.clone());
    let storage_data = web::Data::new(storage);
    let telegram_data = web::Data::new(telegram);
    let generation_data = web::Data::new(generation);

    let bind_addr = format!("{}:{}", config.server_host, config.server_port);
    let webapp_dir = config.webapp_dir.clone();
    let serve_webapp = std::path::Path::new(&webapp_dir).is_dir();
    if !serve_webapp {
        warn!("⚠️ Répertoire mini-app introuvable: {}", webapp_dir);
    }

    // Configuration du serveur Actix-Web
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(config_data.clone())
            .app_data(storage_data.clone())
            .app_data(telegram_data.clone())
            .app_data(generation_data.clone())
            .configure(api::config);

        let app = if serve_webapp {
            app.service(actix_files::Files::new("/webapp", webapp_dir.clone()).index_file("index.html"))
        } else {
            app
        };

        app.default_service(web::route().to(index))
    })
    .bind(&bind_addr)?
    .workers(config.workers)
    .shutdown_timeout(10);

    info!("✅ Backend démarré, API disponible sur http://{}", bind_addr);

    server.run().await
}

/// Page d'accueil minimaliste avec les liens utiles
async fn index() -> actix_web::HttpResponse {
    actix_web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(
            "<html><body>\n\
             <h3>Creator Bot</h3>\n\
             <ul>\n\
               <li><a href='/webapp/'>Ouvrir le Mini App</a></li>\n\
               <li><a href='/health'>Health</a></li>\n\
             </ul>\n\
             </body></html>",
        )
}

/// Configure le tracing pour le logging structuré
fn setup_tracing() {
    let log_level = env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()
        .unwrap_or(tracing::Level::INFO);

    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "json".into());

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with(if log_format == "json" {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(true),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        } else {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_line_number(true)
                    .with_file(true),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        });

    subscriber.init();
}
