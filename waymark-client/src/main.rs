//! waymark-client - command-line front end
//!
//! Thin stand-in for a graphical presentation layer: every subcommand
//! drives a controller operation and prints the resulting view state. No
//! domain logic lives here.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use waymark_client::controller::{
    ListPhase, PlaceController, RouteController, Selection, UserController,
};
use waymark_client::{ApiClient, AssociationResolver, PlaceClient, RouteClient, UserClient};
use waymark_common::config::EndpointResolver;
use waymark_common::dto::{PlaceRequest, RouteRequest, UserRequest};
use waymark_common::events::EventBus;

#[derive(Parser)]
#[command(name = "waymark-client", version, about = "Waymark travel-route client")]
struct Cli {
    /// Backend API base URL (overrides WAYMARK_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Log verbosity
    #[arg(long, default_value = "warn")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Operate on users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Operate on routes
    Routes {
        #[command(subcommand)]
        action: RouteAction,
    },
    /// Operate on places
    Places {
        #[command(subcommand)]
        action: PlaceAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// List all users
    List,
    /// Show one user with their authored routes
    Show { id: i64 },
    /// Create a user
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Replace a user's fields
    Update {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Delete a user
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum RouteAction {
    /// List all routes with author labels
    List {
        /// Only routes with at least this many places
        #[arg(long)]
        min_places: Option<u32>,
    },
    /// Show one route with author and places
    Show { id: i64 },
    /// Create a route
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        author_id: i64,
    },
    /// Replace a route's own fields (not its places)
    Update {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        author_id: i64,
    },
    /// Delete a route
    Delete { id: i64 },
    /// Attach a place to a route
    Attach { route_id: i64, place_id: i64 },
    /// Detach a place from a route
    Detach { route_id: i64, place_id: i64 },
}

#[derive(Subcommand)]
enum PlaceAction {
    /// List all places
    List {
        /// Only places on no route authored by this user
        #[arg(long)]
        not_visited_by: Option<i64>,
    },
    /// Show one place and the routes that include it
    Show { id: i64 },
    /// Create a place
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        description: String,
    },
    /// Replace a place's fields
    Update {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        description: String,
    },
    /// Delete a place
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = EndpointResolver::new(cli.api_url.clone()).resolve();
    info!(api_url = %config.api_url, "resolved backend endpoint");

    let api = ApiClient::new(&config)?;
    let users = UserClient::new(api.clone());
    let routes = RouteClient::new(api.clone());
    let places = PlaceClient::new(api);
    let resolver = AssociationResolver::new(users.clone(), routes.clone(), places.clone());
    let events = EventBus::new(64);

    match cli.command {
        Command::Users { action } => {
            let controller = UserController::new(users, resolver, events);
            run_user_action(&controller, action).await
        }
        Command::Routes { action } => {
            let controller = RouteController::new(routes, resolver, events);
            run_route_action(&controller, action).await
        }
        Command::Places { action } => {
            let controller = PlaceController::new(places, resolver, events);
            run_place_action(&controller, action).await
        }
    }
}

async fn run_user_action(controller: &UserController, action: UserAction) -> Result<()> {
    match action {
        UserAction::List => {
            controller.refresh().await;
            let state = controller.state().await;
            check_phase(&state.phase)?;
            for user in &state.entries {
                println!("{:>6}  {}  <{}>", user.id, user.name, user.email);
            }
        }
        UserAction::Show { id } => {
            controller.select(id).await;
            let state = controller.state().await;
            let Selection::Viewing(user) = state.selection else {
                bail!(error_text(state.last_error));
            };
            println!("{:>6}  {}  <{}>", user.id, user.name, user.email);
            for route in &user.routes {
                println!("        route {:>4}  {}", route.id, route.name);
            }
        }
        UserAction::Create { name, email } => {
            controller.begin_create().await;
            controller.submit(UserRequest { name, email }).await;
            finish_form(controller.state().await.last_error)?;
        }
        UserAction::Update { id, name, email } => {
            controller.select(id).await;
            let state = controller.state().await;
            let Selection::Viewing(user) = state.selection else {
                bail!(error_text(state.last_error));
            };
            controller.begin_edit(user).await;
            controller.submit(UserRequest { name, email }).await;
            finish_form(controller.state().await.last_error)?;
        }
        UserAction::Delete { id } => {
            controller.destroy(id).await;
            finish_form(controller.state().await.last_error)?;
        }
    }
    Ok(())
}

async fn run_route_action(controller: &RouteController, action: RouteAction) -> Result<()> {
    match action {
        RouteAction::List { min_places } => {
            match min_places {
                Some(min) => controller.refresh_with_min_places(min).await,
                None => controller.refresh().await,
            }
            let state = controller.state().await;
            check_phase(&state.phase)?;
            for entry in &state.entries {
                println!(
                    "{:>6}  {}  by {}  ({} places)",
                    entry.route.id,
                    entry.route.name,
                    entry.author.name,
                    entry.route.places.len()
                );
            }
        }
        RouteAction::Show { id } => {
            controller.select(id).await;
            let state = controller.state().await;
            let Selection::Viewing(detail) = state.selection else {
                bail!(error_text(state.last_error));
            };
            println!(
                "{:>6}  {}  by {}",
                detail.route.id, detail.route.name, detail.author.name
            );
            println!("        {}", detail.route.description);
            for place in &detail.route.places {
                println!("        place {:>4}  {}  ({})", place.id, place.name, place.address);
            }
        }
        RouteAction::Create {
            name,
            description,
            author_id,
        } => {
            controller.begin_create().await;
            controller
                .submit(RouteRequest {
                    name,
                    description,
                    author_id,
                })
                .await;
            finish_form(controller.state().await.last_error)?;
        }
        RouteAction::Update {
            id,
            name,
            description,
            author_id,
        } => {
            controller.select(id).await;
            let state = controller.state().await;
            let Selection::Viewing(detail) = state.selection else {
                bail!(error_text(state.last_error));
            };
            controller.begin_edit(detail).await;
            controller
                .submit(RouteRequest {
                    name,
                    description,
                    author_id,
                })
                .await;
            finish_form(controller.state().await.last_error)?;
        }
        RouteAction::Delete { id } => {
            controller.destroy(id).await;
            finish_form(controller.state().await.last_error)?;
        }
        RouteAction::Attach { route_id, place_id } => {
            controller.attach_place(route_id, place_id).await;
            finish_form(controller.state().await.last_error)?;
        }
        RouteAction::Detach { route_id, place_id } => {
            controller.detach_place(route_id, place_id).await;
            finish_form(controller.state().await.last_error)?;
        }
    }
    Ok(())
}

async fn run_place_action(controller: &PlaceController, action: PlaceAction) -> Result<()> {
    match action {
        PlaceAction::List { not_visited_by } => {
            match not_visited_by {
                Some(user_id) => controller.refresh_not_visited(user_id).await,
                None => controller.refresh().await,
            }
            let state = controller.state().await;
            check_phase(&state.phase)?;
            for place in &state.entries {
                println!("{:>6}  {}  ({})", place.id, place.name, place.address);
            }
        }
        PlaceAction::Show { id } => {
            controller.select(id).await;
            let state = controller.state().await;
            let Selection::Viewing(detail) = state.selection else {
                bail!(error_text(state.last_error));
            };
            println!(
                "{:>6}  {}  ({})",
                detail.place.id, detail.place.name, detail.place.address
            );
            println!("        {}", detail.place.description);
            for route in &detail.routes {
                println!("        route {:>4}  {}", route.id, route.name);
            }
        }
        PlaceAction::Create {
            name,
            address,
            description,
        } => {
            controller.begin_create().await;
            controller
                .submit(PlaceRequest {
                    name,
                    address,
                    description,
                })
                .await;
            finish_form(controller.state().await.last_error)?;
        }
        PlaceAction::Update {
            id,
            name,
            address,
            description,
        } => {
            controller.select(id).await;
            let state = controller.state().await;
            let Selection::Viewing(detail) = state.selection else {
                bail!(error_text(state.last_error));
            };
            controller.begin_edit(detail).await;
            controller
                .submit(PlaceRequest {
                    name,
                    address,
                    description,
                })
                .await;
            finish_form(controller.state().await.last_error)?;
        }
        PlaceAction::Delete { id } => {
            controller.destroy(id).await;
            finish_form(controller.state().await.last_error)?;
        }
    }
    Ok(())
}

fn check_phase(phase: &ListPhase) -> Result<()> {
    if let ListPhase::Error(message) = phase {
        bail!("list fetch failed: {}", message);
    }
    Ok(())
}

fn finish_form(last_error: Option<String>) -> Result<()> {
    match last_error {
        Some(message) => bail!(message),
        None => Ok(()),
    }
}

fn error_text(last_error: Option<String>) -> String {
    last_error.unwrap_or_else(|| "entity not found".to_string())
}
