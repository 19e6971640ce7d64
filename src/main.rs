use std::{future::IntoFuture, process, sync::Arc};

use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use vellum::{
    application::{
        error::AppError,
        render::{BlockRegistry, HeroRegistry},
        site::SiteService,
        sitemap::SitemapService,
        static_paths::static_paths,
    },
    cache::{
        CacheConsumer, CacheState, EventQueue, InvalidationCoordinator, LocalPurger, Purger,
        WebhookPurger, plan_mutation,
    },
    config,
    domain::mutation::MutationEvent,
    infra::{
        content,
        error::InfraError,
        http::{self, HookState, PublicState, RouterState},
        telemetry,
    },
};
use vellum_api_types::MutationPayload;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Plan(args) => run_plan(&settings, &args).await,
        config::Command::Paths(_) => run_paths(&settings).await,
    }
}

struct Application {
    router_state: RouterState,
    consumer: Arc<CacheConsumer>,
}

async fn build_application(settings: &config::Settings) -> Result<Application, AppError> {
    let locales = Arc::new(settings.site.locales.clone());
    let table = Arc::new(settings.collections.clone());
    let store = content::connect(&settings.content).await?;

    let site = Arc::new(SiteService::new(
        store.clone(),
        table.clone(),
        locales.clone(),
        Arc::new(BlockRegistry::standard()),
        Arc::new(HeroRegistry::standard()),
    ));
    let sitemap = Arc::new(SitemapService::new(
        store,
        table.clone(),
        locales.clone(),
        settings.site.public_url.clone(),
    ));

    let cache = settings
        .cache
        .enabled
        .then(|| CacheState::new(settings.cache.clone(), locales.clone()));

    let mut purgers: Vec<Arc<dyn Purger>> = Vec::new();
    if let Some(cache) = &cache {
        purgers.push(Arc::new(LocalPurger::new(
            cache.store.clone(),
            cache.registry.clone(),
        )));
    }
    for endpoint in &settings.hooks.purge_webhooks {
        let purger = WebhookPurger::new(
            endpoint.clone(),
            settings.hooks.purge_secret.clone(),
            settings.hooks.purge_timeout,
        )
        .map_err(|err| {
            AppError::from(InfraError::configuration(format!(
                "purge webhook {endpoint}: {err}"
            )))
        })?;
        purgers.push(Arc::new(purger));
    }
    info!(purgers = purgers.len(), cache = cache.is_some(), "Invalidation configured");

    let consumer = Arc::new(CacheConsumer::new(
        settings.cache.consume_batch_limit,
        Arc::new(EventQueue::new()),
        purgers,
    ));
    let coordinator = Arc::new(InvalidationCoordinator::new(
        table,
        locales,
        consumer.clone(),
    ));

    Ok(Application {
        router_state: RouterState {
            public: PublicState {
                site,
                sitemap,
                cache,
            },
            hooks: HookState {
                coordinator,
                secret: settings.hooks.secret.as_deref().map(Arc::from),
            },
        },
        consumer,
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application(&settings).await?;
    let background = spawn_background_consumer(
        &settings,
        app.consumer.clone(),
        app.router_state.public.cache.clone(),
    );

    let result = serve_http(&settings, app.router_state).await;

    background.abort();
    let _ = background.await;

    result
}

/// Drain events queued without an inline consume and sweep expired responses.
fn spawn_background_consumer(
    settings: &config::Settings,
    consumer: Arc<CacheConsumer>,
    cache: Option<CacheState>,
) -> JoinHandle<()> {
    let period = settings.cache.auto_consume_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // Skip the first immediate tick
        loop {
            interval.tick().await;
            consumer.consume().await;
            if let Some(cache) = &cache {
                cache.sweep_expired();
            }
        }
    })
}

async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "Listening");

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    let deadline = async move {
        if signalled_rx.await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        () = deadline => {
            warn!(grace_seconds = grace.as_secs(), "Graceful shutdown timed out");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Print the purge set a mutation event would produce, without executing it.
async fn run_plan(settings: &config::Settings, args: &config::PlanArgs) -> Result<(), AppError> {
    let bytes = tokio::fs::read(&args.event)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let payload: MutationPayload = serde_json::from_slice(&bytes)
        .map_err(|err| AppError::validation(format!("invalid mutation event: {err}")))?;

    let event = MutationEvent::from_payload(payload, &settings.site.locales);
    let targets = plan_mutation(&event, &settings.collections, &settings.site.locales);
    let output = serde_json::to_string_pretty(&targets.to_report())
        .map_err(|err| AppError::unexpected(err.to_string()))?;
    println!("{output}");
    Ok(())
}

async fn run_paths(settings: &config::Settings) -> Result<(), AppError> {
    let store = content::connect(&settings.content).await?;
    let paths = static_paths(
        store.as_ref(),
        &settings.collections,
        &settings.site.locales,
    )
    .await?;
    for path in paths {
        println!("{path}");
    }
    Ok(())
}
