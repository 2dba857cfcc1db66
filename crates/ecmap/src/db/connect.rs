use ecmap_core::{
    async_trait,
    driver::{Capability, Connection, Driver},
    Error, Result,
};

use std::borrow::Cow;
use url::Url;

/// A driver chosen by the scheme of a connection URL.
#[derive(Debug)]
pub(crate) struct Connect {
    url: Url,
}

impl Connect {
    pub(crate) fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(Error::driver_operation_failed)?;

        match url.scheme() {
            "sqlite" => {}
            scheme => ecmap_core::bail!("unsupported database; scheme={scheme}; url={url}"),
        }

        Ok(Self { url })
    }
}

#[async_trait]
impl Driver for Connect {
    fn url(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.url.as_str())
    }

    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        connect_sqlite(&self.url).await
    }
}

#[cfg(feature = "sqlite")]
async fn connect_sqlite(url: &Url) -> Result<Box<dyn Connection>> {
    ecmap_driver_sqlite::Sqlite::new(url.as_str())?.connect().await
}

#[cfg(not(feature = "sqlite"))]
async fn connect_sqlite(_url: &Url) -> Result<Box<dyn Connection>> {
    ecmap_core::bail!("`sqlite` feature not enabled")
}
