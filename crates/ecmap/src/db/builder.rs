use super::{connect::Connect, Db};
use crate::{catalog::Catalog, Config};

use ecmap_core::{driver::Driver, Result};

#[derive(Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Sets the import configuration for the handle.
    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    /// Connects to the database at `url` and loads its catalog.
    pub async fn connect(&mut self, url: &str) -> Result<Db> {
        self.build(Connect::new(url)?).await
    }

    pub async fn build(&mut self, driver: impl Driver) -> Result<Db> {
        let mut connection = driver.connect().await?;
        let catalog = Catalog::load(&mut *connection).await?;

        tracing::debug!(
            url = %driver.url(),
            schemas = catalog.schemas.len(),
            tables = catalog.layout.tables.len(),
            "database opened"
        );

        Ok(Db {
            connection,
            catalog,
            config: self.config.clone(),
        })
    }
}
