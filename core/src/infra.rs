//! Database provisioning: ephemeral containers, client connections and schema
//! initialization for both stores.
//!
//! Containers live as long as the returned instance handle; dropping the
//! handle stops the container.

use crate::error::SetupError;
use log::{error, info};
use mongodb::bson::{Document, doc};
use mongodb::options::{ClientOptions, CreateCollectionOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Database, IndexModel};
use testcontainers_modules::mongo::Mongo;
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::{ContainerAsync, ImageExt};
use tokio_postgres::NoTls;

pub const DATABASE_NAME: &str = "test";
pub const POSTGRES_IMAGE_TAG: &str = "16-alpine";
pub const POSTGRES_USER: &str = "user";
pub const POSTGRES_PASSWORD: &str = "password";
const POSTGRES_PORT: u16 = 5432;
const MONGO_PORT: u16 = 27017;

/// Unvalidated collection holding embedded project documents.
pub const PROJECTS_COLLECTION: &str = "projects";
/// Schema-validated, indexed twin of [`PROJECTS_COLLECTION`].
pub const VALIDATED_PROJECTS_COLLECTION: &str = "projects_index";

/// Relational schema shared by the benchmark and the CRUD service.
pub const POSTGRES_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    username VARCHAR(255) NOT NULL,
    first_name VARCHAR(255) NOT NULL,
    last_name VARCHAR(255) NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    id INT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    identifier VARCHAR(48) NOT NULL,
    invite_code VARCHAR(128) NOT NULL,
    sprint_duration INT NOT NULL,
    owner_id INT NOT NULL,
    CONSTRAINT fk_owner FOREIGN KEY(owner_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS sprints (
    id INT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    project_id INT NOT NULL,
    start_date BIGINT NOT NULL,
    end_date BIGINT NOT NULL,
    CONSTRAINT fk_project FOREIGN KEY(project_id) REFERENCES projects(id)
);
";

/// A reachable Postgres server, optionally backed by a container we own.
pub struct PostgresInstance {
    pub url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

impl PostgresInstance {
    /// Uses `url` when given, otherwise starts a fresh container.
    pub async fn provision(url: Option<String>) -> Result<Self, SetupError> {
        match url {
            Some(url) => {
                info!("Using existing Postgres server");
                Ok(Self {
                    url,
                    _container: None,
                })
            }
            None => Self::start().await,
        }
    }

    pub async fn start() -> Result<Self, SetupError> {
        info!("Starting Postgres container (postgres:{POSTGRES_IMAGE_TAG})...");
        let container_error = |source| SetupError::Container {
            image: "postgres",
            source,
        };

        let container = Postgres::default()
            .with_db_name(DATABASE_NAME)
            .with_user(POSTGRES_USER)
            .with_password(POSTGRES_PASSWORD)
            .with_tag(POSTGRES_IMAGE_TAG)
            .start()
            .await
            .map_err(container_error)?;
        let host = container.get_host().await.map_err(container_error)?;
        let port = container
            .get_host_port_ipv4(POSTGRES_PORT)
            .await
            .map_err(container_error)?;

        Ok(Self {
            url: format!(
                "postgres://{POSTGRES_USER}:{POSTGRES_PASSWORD}@{host}:{port}/{DATABASE_NAME}"
            ),
            _container: Some(container),
        })
    }
}

/// A reachable MongoDB server, optionally backed by a container we own.
pub struct MongoInstance {
    pub uri: String,
    _container: Option<ContainerAsync<Mongo>>,
}

impl MongoInstance {
    /// Uses `uri` when given, otherwise starts a fresh container.
    pub async fn provision(uri: Option<String>) -> Result<Self, SetupError> {
        match uri {
            Some(uri) => {
                info!("Using existing MongoDB server");
                Ok(Self {
                    uri,
                    _container: None,
                })
            }
            None => Self::start().await,
        }
    }

    pub async fn start() -> Result<Self, SetupError> {
        info!("Starting MongoDB container...");
        let container_error = |source| SetupError::Container {
            image: "mongo",
            source,
        };

        let container = Mongo::default().start().await.map_err(container_error)?;
        let host = container.get_host().await.map_err(container_error)?;
        let port = container
            .get_host_port_ipv4(MONGO_PORT)
            .await
            .map_err(container_error)?;

        Ok(Self {
            uri: format!("mongodb://{host}:{port}/"),
            _container: Some(container),
        })
    }
}

/// Opens a Postgres connection and drives it on a background task.
pub async fn connect_postgres(url: &str) -> Result<tokio_postgres::Client, SetupError> {
    let (client, connection) = tokio_postgres::connect(url, NoTls)
        .await
        .map_err(SetupError::postgres("connecting"))?;

    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!("Postgres connection closed with error: {}", err);
        }
    });

    Ok(client)
}

/// Connects to MongoDB and pings the server so failures surface at setup.
///
/// Managed clusters expect the stable server API, enabled by `stable_api`.
pub async fn connect_mongo(uri: &str, stable_api: bool) -> Result<Client, SetupError> {
    let mut options = ClientOptions::parse(uri)
        .await
        .map_err(SetupError::mongo("parsing the connection string"))?;
    if stable_api {
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    }

    let client = Client::with_options(options).map_err(SetupError::mongo("creating the client"))?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 }, None)
        .await
        .map_err(SetupError::mongo("pinging the server"))?;

    Ok(client)
}

/// Creates the relational tables when missing.
pub async fn initialize_postgres(client: &tokio_postgres::Client) -> Result<(), SetupError> {
    client
        .batch_execute(POSTGRES_SCHEMA)
        .await
        .map_err(SetupError::postgres("creating tables"))
}

/// `$jsonSchema` validator enforced on [`VALIDATED_PROJECTS_COLLECTION`].
pub fn projects_validator() -> Document {
    doc! {
        "$jsonSchema": {
            "bsonType": "object",
            "required": ["name", "identifier", "invite_code", "sprint_duration", "owner", "sprints"],
            "properties": {
                "name": { "bsonType": "string", "description": "The project name" },
                "identifier": { "bsonType": "string", "description": "Unique project identifier" },
                "invite_code": {
                    "bsonType": "string",
                    "description": "Code used to invite others to the project",
                },
                "sprint_duration": { "bsonType": "int", "description": "The duration of a sprint" },
                "owner": {
                    "bsonType": "object",
                    "required": ["username", "first_name", "last_name"],
                    "properties": {
                        "username": { "bsonType": "string" },
                        "first_name": { "bsonType": "string" },
                        "last_name": { "bsonType": "string" },
                    },
                },
                "sprints": {
                    "bsonType": "array",
                    "items": {
                        "bsonType": "object",
                        "required": ["name", "start_date", "end_date"],
                        "properties": {
                            "name": { "bsonType": "string" },
                            "start_date": { "bsonType": "long" },
                            "end_date": { "bsonType": "long" },
                        },
                    },
                },
            },
        }
    }
}

/// Creates the validated collection and its `sprint_duration` index when missing.
pub async fn initialize_mongo(db: &Database) -> Result<(), SetupError> {
    let existing = db
        .list_collection_names(None)
        .await
        .map_err(SetupError::mongo("listing collections"))?;

    if !existing.iter().any(|name| name == VALIDATED_PROJECTS_COLLECTION) {
        let options = CreateCollectionOptions::builder()
            .validator(projects_validator())
            .build();
        db.create_collection(VALIDATED_PROJECTS_COLLECTION, options)
            .await
            .map_err(SetupError::mongo("creating the validated collection"))?;
    }

    let index = IndexModel::builder()
        .keys(doc! { "sprint_duration": 1 })
        .build();
    db.collection::<Document>(VALIDATED_PROJECTS_COLLECTION)
        .create_index(index, None)
        .await
        .map_err(SetupError::mongo("creating the sprint_duration index"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate_projects;
    use mongodb::bson;

    #[test]
    fn validator_requires_every_project_field() {
        let validator = projects_validator();
        let schema = validator.get_document("$jsonSchema").unwrap();
        let required: Vec<&str> = schema
            .get_array("required")
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(
            required,
            ["name", "identifier", "invite_code", "sprint_duration", "owner", "sprints"]
        );
    }

    #[test]
    fn generated_project_serializes_to_validated_shape() {
        let project = generate_projects(1).remove(0);
        let document = bson::to_document(&project).unwrap();

        assert!(matches!(document.get("sprint_duration"), Some(bson::Bson::Int32(_))));
        let sprint = document.get_array("sprints").unwrap()[0]
            .as_document()
            .unwrap()
            .clone();
        assert!(matches!(sprint.get("start_date"), Some(bson::Bson::Int64(_))));
        assert!(document.get_document("owner").unwrap().contains_key("username"));
    }

    #[test]
    fn schema_declares_three_tables_with_foreign_keys() {
        for table in ["users", "projects", "sprints"] {
            assert!(POSTGRES_SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")));
        }
        assert!(POSTGRES_SCHEMA.contains("REFERENCES users(id)"));
        assert!(POSTGRES_SCHEMA.contains("REFERENCES projects(id)"));
    }
}
