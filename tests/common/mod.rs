//! Shared fixtures: a scripted registry transport and response builders
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use impi_search::infrastructure::{
    AppConfig, RegistryTransport, TransportFailure, TransportFailureKind, TransportResponse,
};

pub const DEFAULT_TOKEN: &str = "-4410:7700";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Bootstrap { url: String },
    Partial { url: String, form: Vec<(String, String)> },
}

type Scripted = Result<TransportResponse, TransportFailure>;

#[derive(Default)]
struct Script {
    bootstraps: VecDeque<Scripted>,
    pages: VecDeque<Scripted>,
    calls: Vec<RecordedCall>,
    cancel_after_pages: Option<(usize, CancellationToken)>,
}

/// Transport that replays queued responses and records every call.
/// Clones share the same script, so a test keeps one handle for assertions.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_landing(&self, token: Option<&str>) -> &Self {
        self.push_bootstrap(Ok(TransportResponse::ok(landing_page(token))))
    }

    pub fn push_bootstrap(&self, result: Scripted) -> &Self {
        self.script.lock().unwrap().bootstraps.push_back(result);
        self
    }

    pub fn push_page(&self, body: impl Into<String>) -> &Self {
        self.push_page_result(Ok(TransportResponse::ok(body)))
    }

    pub fn push_page_result(&self, result: Scripted) -> &Self {
        self.script.lock().unwrap().pages.push_back(result);
        self
    }

    /// Cancels `token` once `pages` page responses have been handed out.
    pub fn cancel_after_pages(&self, pages: usize, token: CancellationToken) {
        self.script.lock().unwrap().cancel_after_pages = Some((pages, token));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn bootstrap_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, RecordedCall::Bootstrap { .. }))
            .count()
    }

    pub fn page_forms(&self) -> Vec<Vec<(String, String)>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Partial { form, .. } => Some(form),
                RecordedCall::Bootstrap { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl RegistryTransport for ScriptedTransport {
    async fn bootstrap(
        &self,
        url: &str,
        cancellation_token: &CancellationToken,
    ) -> Result<TransportResponse, TransportFailure> {
        if cancellation_token.is_cancelled() {
            return Err(TransportFailure::Cancelled);
        }
        let mut script = self.script.lock().unwrap();
        script.calls.push(RecordedCall::Bootstrap { url: url.to_string() });
        script
            .bootstraps
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse::ok(landing_page(Some(DEFAULT_TOKEN)))))
    }

    async fn submit_partial(
        &self,
        url: &str,
        form: &[(String, String)],
        cancellation_token: &CancellationToken,
    ) -> Result<TransportResponse, TransportFailure> {
        if cancellation_token.is_cancelled() {
            return Err(TransportFailure::Cancelled);
        }
        let mut script = self.script.lock().unwrap();
        script.calls.push(RecordedCall::Partial {
            url: url.to_string(),
            form: form.to_vec(),
        });
        let result = script
            .pages
            .pop_front()
            .unwrap_or_else(|| Err(TransportFailure::connection("script exhausted")));

        let served = script
            .calls
            .iter()
            .filter(|call| matches!(call, RecordedCall::Partial { .. }))
            .count();
        if let Some((after, token)) = &script.cancel_after_pages {
            if served >= *after {
                token.cancel();
            }
        }
        result
    }
}

pub fn field<'a>(form: &'a [(String, String)], name: &str) -> Option<&'a str> {
    form.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
}

pub fn timeout() -> TransportFailure {
    TransportFailure::timeout("operation timed out")
}

pub fn http_status(status: u16) -> TransportFailure {
    TransportFailure::Failed {
        kind: TransportFailureKind::HttpStatus(status),
        message: format!("HTTP {status}"),
    }
}

/// Default config; retries keep the 2 s delay, so flow tests run on paused time.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.registry.landing_url = "http://registry.test/marcanet/".to_string();
    config.registry.search_url = "http://registry.test/marcanet/vistas/common/datos/bsqFoneticaCompleta.pgi".to_string();
    config.registry.denomination_url = "http://registry.test/marcanet/vistas/common/home.pgi".to_string();
    config
}

pub fn landing_page(token: Option<&str>) -> String {
    let input = token.map_or_else(String::new, |value| {
        format!(
            r#"<input type="hidden" name="javax.faces.ViewState" id="j_id1:javax.faces.ViewState:0" value="{value}" autocomplete="off" />"#
        )
    });
    format!(
        r#"<!DOCTYPE html><html><head><title>MARCanet</title></head><body><form id="frmBsqDen" name="frmBsqDen">{input}</form></body></html>"#
    )
}

pub fn row(index: usize, class: &str) -> String {
    format!(
        r##"<tr data-ri="{index}" class="ui-widget-content ui-datatable-even"><td>{n}</td><td>NOMINATIVA</td><td></td><td>TITULAR {index} S.A. DE C.V.</td><td><a href="#">{case}</a></td><td>{reg}</td><td><a href="#">LUNA {index}</a></td><td>{class}</td><td><img src="logo.png"/></td></tr>"##,
        n = index + 1,
        case = 2_000_000 + index,
        reg = 1_500_000 + index,
    )
}

pub fn short_row(index: usize) -> String {
    format!(r#"<tr data-ri="{index}"><td>{index}</td><td>X</td><td>Y</td><td>Z</td><td>W</td></tr>"#)
}

pub fn rows(start: usize, count: usize) -> String {
    (start..start + count).map(|index| row(index, "30")).collect()
}

/// Phonetic search partial response wrapping the given table rows.
pub fn page_response(rows: &str, extra: &str) -> String {
    format!(
        r#"<?xml version='1.0' encoding='UTF-8'?>
<partial-response id="j_id1"><changes><update id="frmBsqFonetica"><![CDATA[<form id="frmBsqFonetica"><div id="frmBsqFonetica:resultadoExpediente" class="ui-datatable">{extra}<table><tbody id="frmBsqFonetica:resultadoExpediente_data" class="ui-datatable-data ui-widget-content">{rows}</tbody></table></div></form>]]></update></changes></partial-response>"#
    )
}

pub fn full_page(start: usize) -> String {
    page_response(&rows(start, 15), "")
}

pub fn empty_page() -> String {
    page_response(
        r#"<tr class="ui-widget-content ui-datatable-empty-message"><td colspan="9">No se encontraron registros.</td></tr>"#,
        "",
    )
}

/// Same response with a renewed view state appended as a second update.
pub fn with_view_state(body: &str, token: &str) -> String {
    body.replace(
        "</changes>",
        &format!(r#"<update id="j_id1:javax.faces.ViewState:0"><![CDATA[{token}]]></update></changes>"#),
    )
}

pub fn fragmentless_envelope() -> String {
    r#"<?xml version='1.0' encoding='UTF-8'?><partial-response id="j_id1"><changes></changes></partial-response>"#.to_string()
}

pub fn view_expired() -> String {
    r#"<?xml version='1.0' encoding='UTF-8'?><partial-response><error><error-name>class javax.faces.application.ViewExpiredException</error-name><error-message><![CDATA[viewId:/vistas/common/home.xhtml]]></error-message></error></partial-response>"#.to_string()
}
