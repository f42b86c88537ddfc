use std::net::TcpListener;

use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::dev::Server;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::FlashMessagesFramework;
use secrecy::ExposeSecret;
use tera::Tera;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::news::NewsCache;
use crate::news::NewsClient;
use crate::rate_limit::RateLimiter;
use crate::routes::about;
use crate::routes::admin_dashboard;
use crate::routes::health_check;
use crate::routes::home;
use crate::routes::logout;
use crate::routes::manage;
use crate::routes::manage_form;
use crate::routes::resend;
use crate::routes::subscribe;
use crate::routes::subscribe_form;
use crate::routes::thank_you;
use crate::routes::trending;
use crate::routes::unsubscribe;
use crate::routes::unsubscribe_form;
use crate::routes::verify;
use crate::routes::verify_form;
use crate::sheet_store::SheetStore;
use crate::verification::VerificationStore;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Wrapper over `startup::run` that builds a `Server`
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;

        // the port may have been randomised by the OS (port 0); keep the real one
        let port = listener.local_addr().unwrap().port();

        let sender = cfg
            .email_client
            .sender()
            .map_err(|e| anyhow::anyhow!(e))?;
        let timeout = cfg.email_client.timeout();
        let email_client = EmailClient::new(
            cfg.email_client.base_url.clone(),
            sender,
            cfg.email_client.authorization_token.clone(),
            timeout,
        );

        let server = run(listener, email_client, &cfg).await?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call
    /// (or passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// Wrapper for the trending page size (because raw primitives would conflict
/// with one another when passed around by `Data`)
pub struct TrendingPageSize(pub u32);

/// The server is not responsible for binding to an address, it only listens
/// to an already bound address.
///
/// Declares all API endpoints and assembles the shared state: the two
/// in-memory tables (pending verifications, rate-limit counters), the three
/// outbound HTTP clients, the news cache and the template engine. `Data` is
/// an `Arc` underneath, so each worker sees the same tables.
pub async fn run(
    listener: TcpListener,
    email_client: EmailClient,
    cfg: &Settings,
) -> Result<Server, anyhow::Error> {
    let secret_key = Key::from(cfg.application.hmac_secret.expose_secret().as_bytes());

    // flash messages ride on a signed client-side cookie
    let cookie_store = CookieMessageStore::builder(secret_key.clone()).build();
    let msg_framework = FlashMessagesFramework::builder(cookie_store).build();

    let tera = Tera::new("templates/**/*.html")?;

    let verifications = Data::new(VerificationStore::new(&cfg.verification));
    let limiter = Data::new(RateLimiter::new(&cfg.rate_limit));
    let sheet = Data::new(SheetStore::new(&cfg.sheet_store));
    let news_client = Data::new(NewsClient::new(&cfg.news));
    let news_cache = Data::new(NewsCache::new(cfg.news.cache_ttl_seconds));
    let email_client = Data::new(email_client);
    let tera = Data::new(tera);
    let page_size = Data::new(TrendingPageSize(cfg.news.trending_page_size));

    // one copy of the `App` per worker; everything captured must be cloneable
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(msg_framework.clone())
            // sessions are cookie-backed too; the only thing stored is the
            // verified email, which fits comfortably. `CookieSessionStore` is
            // a stateless unit struct (and not `Clone`), so each worker
            // constructs its own.
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                secret_key.clone(),
            ))
            .route("/", web::get().to(home))
            .route("/health_check", web::get().to(health_check))
            .route("/subscribe", web::get().to(subscribe_form))
            .route("/subscribe", web::post().to(subscribe))
            .route("/verify", web::get().to(verify_form))
            .route("/verify", web::post().to(verify))
            .route("/resend", web::post().to(resend))
            .route("/manage", web::get().to(manage_form))
            .route("/manage", web::post().to(manage))
            .route("/unsubscribe", web::get().to(unsubscribe_form))
            .route("/unsubscribe", web::post().to(unsubscribe))
            .route("/trending", web::get().to(trending))
            .route("/thank-you", web::get().to(thank_you))
            .route("/about", web::get().to(about))
            .route("/admin", web::get().to(admin_dashboard))
            .route("/logout", web::get().to(logout))
            .app_data(verifications.clone())
            .app_data(limiter.clone())
            .app_data(sheet.clone())
            .app_data(news_client.clone())
            .app_data(news_cache.clone())
            .app_data(email_client.clone())
            .app_data(tera.clone())
            .app_data(page_size.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
