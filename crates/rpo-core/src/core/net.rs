//! One-time HTTP context for the snapshot-bundle transfer: proxy settings
//! come from the standard environment variables, credentials from
//! `~/.netrc`, and `RPO_CURL_VERBOSE=1` enables connection debugging.
//!
//! No request timeout is imposed here; the bundle transfer relies on the
//! transport layer's own behavior.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use url::Url;

use super::config::{Settings, LAUNCHER_VERSION};

pub(crate) struct HttpContext {
    client: reqwest::blocking::Client,
    credentials: Vec<NetrcCredential>,
}

#[derive(Debug, PartialEq, Eq)]
struct NetrcCredential {
    machine: String,
    login: String,
    password: String,
}

impl HttpContext {
    /// Build the process-wide HTTP context. This happens once per run, not
    /// per source.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying client cannot be constructed.
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let mut builder =
            reqwest::blocking::Client::builder().user_agent(format!("rpo/{LAUNCHER_VERSION}"));
        if settings.curl_verbose {
            builder = builder.connection_verbose(true);
        }
        let client = builder.build().context("failed to build http client")?;
        let credentials = settings
            .home_dir
            .as_deref()
            .map(load_netrc)
            .unwrap_or_default();
        Ok(Self {
            client,
            credentials,
        })
    }

    /// Issue a GET, attaching basic-auth credentials when the URL's host
    /// has a `.netrc` entry. Transport failures surface as errors; HTTP
    /// status handling is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be sent at all.
    pub(crate) fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        let mut request = self.client.get(url);
        if let Some(credential) = self.credential_for(url) {
            request = request.basic_auth(&credential.login, Some(&credential.password));
        }
        request
            .send()
            .with_context(|| format!("failed to fetch {url}"))
    }

    fn credential_for(&self, url: &str) -> Option<&NetrcCredential> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        self.credentials
            .iter()
            .find(|credential| credential.machine == host)
    }
}

fn load_netrc(home: &Path) -> Vec<NetrcCredential> {
    match fs::read_to_string(home.join(".netrc")) {
        Ok(contents) => parse_netrc(&contents),
        Err(_) => Vec::new(),
    }
}

/// Minimal `.netrc` reader: `machine`/`login`/`password` token triples.
/// `default` entries and macros are ignored.
fn parse_netrc(contents: &str) -> Vec<NetrcCredential> {
    let mut entries = Vec::new();
    let mut machine = None;
    let mut login = None;
    let mut password = None;
    let mut tokens = contents.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "machine" => {
                flush(&mut entries, &mut machine, &mut login, &mut password);
                machine = tokens.next().map(str::to_string);
            }
            "default" => flush(&mut entries, &mut machine, &mut login, &mut password),
            "login" => login = tokens.next().map(str::to_string),
            "password" => password = tokens.next().map(str::to_string),
            _ => {}
        }
    }
    flush(&mut entries, &mut machine, &mut login, &mut password);
    entries
}

fn flush(
    entries: &mut Vec<NetrcCredential>,
    machine: &mut Option<String>,
    login: &mut Option<String>,
    password: &mut Option<String>,
) {
    let machine = machine.take();
    let login = login.take();
    let password = password.take();
    if let (Some(machine), Some(login), Some(password)) = (machine, login, password) {
        entries.push(NetrcCredential {
            machine,
            login,
            password,
        });
    }
}
