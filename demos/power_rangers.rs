extern crate vetted;

use std::sync::{Arc, Mutex};

use serde::{de::IgnoredAny, Deserialize, Serialize};
use vetted::{
    controller::{Controller, ControllerOptions, Input, Validation},
    openapi::{Info, OpenApiRegistry, SecurityScheme},
    request::Request,
    response::Response,
    result::Result,
    schema::Schema,
    Config, Error, Server,
};

#[derive(Debug, Clone, Serialize)]
struct PowerRanger {
    id: u64,
    name: String,
    color: String,
    seasons: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct ById {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Search {
    name: Option<String>,
    seasons: Option<Vec<u32>>,
}

#[derive(Debug, Deserialize)]
struct NewPowerRanger {
    name: String,
    color: String,
    seasons: Vec<u32>,
}

type Store = Arc<Mutex<Vec<PowerRanger>>>;

fn power_ranger() -> Schema {
    Schema::object([
        ("id", Schema::integer().describe("Power ranger id")),
        ("name", Schema::string()),
        ("color", color()),
        ("seasons", Schema::array(Schema::integer().min(1.0))),
    ])
}

fn color() -> Schema {
    Schema::enumeration(["red", "blue", "yellow", "pink", "black", "green", "white"])
}

fn snapshot(store: &Store) -> Vec<PowerRanger> {
    store
        .lock()
        .map(|rangers| rangers.clone())
        .unwrap_or_default()
}

async fn log_request(req: Result<Request<String>>) -> Result<Request<String>> {
    if let Ok(req) = req.as_ref() {
        tracing::debug!(method = %req.method(), path = req.uri().path(), "incoming");
    }
    req
}

async fn log_error(res: Result<Response<String>>) -> Result<Response<String>> {
    if let Err(err) = res.as_ref() {
        tracing::warn!(code = err.code(), "request failed");
    }
    res
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    if let Err(err) = vetted::logging::init(&config) {
        eprintln!("logging disabled: {err}");
    }

    let store: Store = Arc::new(Mutex::new(vec![
        PowerRanger {
            id: 1,
            name: "Jason Lee Scott".into(),
            color: "red".into(),
            seasons: vec![1, 2],
        },
        PowerRanger {
            id: 2,
            name: "Tommy Oliver".into(),
            color: "green".into(),
            seasons: vec![1, 2, 3, 4],
        },
    ]));

    let registry = OpenApiRegistry::new().with_security("bearerAuth", SecurityScheme::bearer());
    let options = ControllerOptions::new("Power Rangers", "/power-rangers")
        .validate_responses(config.validate_responses);

    let list_store = store.clone();
    let find_store = store.clone();
    let create_store = store.clone();

    let controller = Controller::new(options, &registry)
        .get(
            "/",
            Validation::new(Schema::array(power_ranger()))
                .query(Schema::object([
                    ("name", Schema::string().optional().describe("Exact name")),
                    (
                        "seasons",
                        Schema::array(Schema::integer().min(1.0))
                            .optional()
                            .describe("Seasons the ranger appeared in"),
                    ),
                ]))
                .summary("List power rangers"),
            move |input: Input<IgnoredAny, Search>| {
                let rangers = snapshot(&list_store);

                async move {
                    let Search { name, seasons } = input.query;
                    let found: Vec<PowerRanger> = rangers
                        .into_iter()
                        .filter(|ranger| name.as_ref().map_or(true, |name| &ranger.name == name))
                        .filter(|ranger| {
                            seasons.as_ref().map_or(true, |seasons| {
                                seasons.iter().all(|season| ranger.seasons.contains(season))
                            })
                        })
                        .collect();

                    Result::from(Ok::<_, Error>(found))
                }
            },
        )
        .get(
            "/:id",
            Validation::new(power_ranger())
                .params(Schema::object([("id", Schema::integer().min(1.0))]))
                .summary("Find a power ranger"),
            move |input: Input<ById>| {
                let rangers = snapshot(&find_store);

                async move {
                    let id = input.params.id;
                    Result::from(
                        rangers
                            .into_iter()
                            .find(|ranger| ranger.id == id)
                            .ok_or_else(|| Error::not_found(format!("Power ranger {id} not found"))),
                    )
                }
            },
        )
        .post(
            "/",
            Validation::new(power_ranger())
                .body(Schema::object([
                    ("name", Schema::string().min(1.0)),
                    ("color", color()),
                    ("seasons", Schema::array(Schema::integer().min(1.0))),
                ]))
                .summary("Create a power ranger"),
            move |input: Input<IgnoredAny, IgnoredAny, NewPowerRanger>| {
                let store = create_store.clone();

                async move {
                    let NewPowerRanger {
                        name,
                        color,
                        seasons,
                    } = input.body;

                    let created = store
                        .lock()
                        .map(|mut rangers| {
                            let ranger = PowerRanger {
                                id: rangers.len() as u64 + 1,
                                name,
                                color,
                                seasons,
                            };
                            rangers.push(ranger.clone());
                            ranger
                        })
                        .map_err(|_| Error::internal("Store unavailable"));

                    Result::from(created)
                }
            },
        );

    let server = Server::new()
        .pre(log_request)
        .after(log_error)
        .router(controller.into_router())
        .docs(
            &config.docs_path,
            &registry,
            Info::new("Power Rangers", "1.0.0").description("Typed, validated and documented endpoints."),
        );

    if let Err(err) = server.listen(config.addr).await {
        tracing::error!(error = %err, "server stopped");
    }
}
