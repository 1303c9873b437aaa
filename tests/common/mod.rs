#![allow(dead_code)]

use serde::{de::IgnoredAny, Deserialize, Serialize};
use vetted::{
    controller::{Controller, ControllerOptions, Input, Validation},
    openapi::{Info, OpenApiRegistry, SecurityScheme},
    request::{Method, Request},
    result::Result,
    schema::Schema,
    Error, Server,
};

#[derive(Debug, Clone, Serialize)]
pub struct Ranger {
    pub id: u64,
    pub name: String,
    pub color: String,
    pub seasons: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ById {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct Listing {
    pub name: Option<String>,
    pub seasons: Option<Vec<u32>>,
}

#[derive(Debug, Deserialize)]
pub struct NewRanger {
    pub name: String,
    pub color: String,
}

pub fn rangers() -> Vec<Ranger> {
    vec![
        Ranger {
            id: 1,
            name: "Jason".into(),
            color: "red".into(),
            seasons: vec![1, 2],
        },
        Ranger {
            id: 2,
            name: "Kimberly".into(),
            color: "pink".into(),
            seasons: vec![1, 2, 3],
        },
        Ranger {
            id: 3,
            name: "Tommy".into(),
            color: "green".into(),
            seasons: vec![2, 3, 4],
        },
    ]
}

pub fn ranger_schema() -> Schema {
    Schema::object([
        ("id", Schema::integer()),
        ("name", Schema::string()),
        ("color", Schema::enumeration(["red", "pink", "green", "blue"])),
        ("seasons", Schema::array(Schema::integer())),
    ])
}

async fn list(input: Input<IgnoredAny, Listing>) -> Result<Vec<Ranger>> {
    let Listing { name, seasons } = input.query;

    let found: Vec<Ranger> = rangers()
        .into_iter()
        .filter(|ranger| name.as_ref().map_or(true, |name| &ranger.name == name))
        .filter(|ranger| {
            seasons
                .as_ref()
                .map_or(true, |seasons| seasons.iter().all(|season| ranger.seasons.contains(season)))
        })
        .collect();

    Ok(found).into()
}

async fn find(input: Input<ById>) -> Result<Ranger> {
    rangers()
        .into_iter()
        .find(|ranger| ranger.id == input.params.id)
        .ok_or_else(|| Error::not_found(format!("Ranger {} not found", input.params.id)))
        .into()
}

async fn create(input: Input<IgnoredAny, IgnoredAny, NewRanger>) -> Result<Ranger> {
    Ok(Ranger {
        id: 4,
        name: input.body.name,
        color: input.body.color,
        seasons: Vec::new(),
    })
    .into()
}

async fn retire(_input: Input<ById>) -> Result<serde_json::Value> {
    // wrong shape on purpose: logged, still sent
    Ok(serde_json::json!({ "retired": "yes" })).into()
}

pub fn registry() -> OpenApiRegistry {
    OpenApiRegistry::new().with_security("bearerAuth", SecurityScheme::bearer())
}

pub fn server(registry: &OpenApiRegistry) -> Server {
    let by_id = Schema::object([("id", Schema::integer().min(1.0))]);

    let controller = Controller::new(
        ControllerOptions::new("Power Rangers", "/power-rangers").validate_responses(true),
        registry,
    )
    .get(
        "/",
        Validation::new(Schema::array(ranger_schema()))
            .query(Schema::object([
                ("name", Schema::string().optional()),
                ("seasons", Schema::array(Schema::integer().min(1.0)).optional()),
            ]))
            .operation_id("listPowerRangers"),
        list,
    )
    .get(
        "/:id",
        Validation::new(ranger_schema()).params(by_id.clone()),
        find,
    )
    .post(
        "/",
        Validation::new(ranger_schema()).body(Schema::object([
            ("name", Schema::string().min(1.0)),
            ("color", Schema::enumeration(["red", "pink", "green", "blue"])),
        ])),
        create,
    )
    .delete(
        "/:id",
        Validation::new(Schema::object([("retired", Schema::boolean())])).params(by_id),
        retire,
    );

    Server::new()
        .router(controller.into_router())
        .docs("/openapi.json", registry, Info::new("Power Rangers", "1.0.0"))
}

pub fn request(method: Method, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.to_owned())
}
