// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! axe-core binding.
//!
//! [`AxeScanner`] calls the page's global `axe.run(context, options)` and
//! parses the violations out of the result object. axe itself must already be
//! loaded; if it is not, every scan fails with a [`ScanError`].

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::future::Future;

use js_sys::{Array, Object, Promise, Reflect};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::Node;

use vigil_core::config::RunOnly;
use vigil_core::engine::{ScanRequest, Scanner};
use vigil_core::error::ScanError;
use vigil_core::issue::Impact;
use vigil_core::violation::{NodeResult, RuleViolation, TargetSegment};

use crate::dom::{NodeRef, WebDom};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = axe, js_name = "run", catch)]
    fn axe_run(context: &JsValue, options: &JsValue) -> Result<Promise, JsValue>;
}

/// A [`Scanner`] backed by axe-core.
#[derive(Clone, Debug)]
pub struct AxeScanner {
    dom: Rc<WebDom>,
}

impl AxeScanner {
    /// Creates a scanner resolving handles through `dom`.
    #[must_use]
    pub fn new(dom: Rc<WebDom>) -> Self {
        Self { dom }
    }
}

impl Scanner<NodeRef> for AxeScanner {
    fn scan(
        &mut self,
        request: &ScanRequest<NodeRef>,
    ) -> impl Future<Output = Result<Vec<RuleViolation<NodeRef>>, ScanError>> {
        let started = start(&self.dom, request);
        let dom = Rc::clone(&self.dom);
        async move {
            let raw = JsFuture::from(started?)
                .await
                .map_err(|err| js_error("axe.run rejected", &err))?;
            parse_results(&raw, &dom)
        }
    }
}

fn start(dom: &WebDom, request: &ScanRequest<NodeRef>) -> Result<Promise, ScanError> {
    let include = node_array(dom, &request.context.include);
    if include.length() == 0 {
        return Err(ScanError::new("every element to scan is gone"));
    }
    let context = Object::new();
    set(&context, "include", &include)?;
    set(&context, "exclude", &node_array(dom, &request.context.exclude))?;

    let options = Object::new();
    set(&options, "elementRef", &JsValue::from_bool(request.element_ref))?;
    set(&options, "iframes", &JsValue::from_bool(request.iframes))?;
    set(&options, "preload", &JsValue::from_bool(request.preload))?;
    set(&options, "resultTypes", &string_array(request.result_types.iter().copied()))?;
    if !request.rules.is_empty() {
        let rules = Object::new();
        for rule in &request.rules {
            let setting = Object::new();
            set(&setting, "enabled", &JsValue::from_bool(rule.enabled))?;
            set(&rules, &rule.id, &setting)?;
        }
        set(&options, "rules", &rules)?;
    }
    if let Some(run_only) = &request.run_only {
        let (kind, values) = match run_only {
            RunOnly::Rules(values) => ("rule", values),
            RunOnly::Tags(values) => ("tag", values),
        };
        let restriction = Object::new();
        set(&restriction, "type", &JsValue::from_str(kind))?;
        set(&restriction, "values", &string_array(values.iter().map(String::as_str)))?;
        set(&options, "runOnly", &restriction)?;
    }

    axe_run(&context, &options).map_err(|err| js_error("axe.run failed", &err))
}

fn parse_results(raw: &JsValue, dom: &WebDom) -> Result<Vec<RuleViolation<NodeRef>>, ScanError> {
    let violations = get(raw, "violations");
    let Some(violations) = violations.dyn_ref::<Array>() else {
        return Err(ScanError::new("axe results have no violations array"));
    };
    violations
        .iter()
        .map(|v| parse_violation(&v, dom))
        .collect()
}

fn parse_violation(raw: &JsValue, dom: &WebDom) -> Result<RuleViolation<NodeRef>, ScanError> {
    let id = get_string(raw, "id").ok_or_else(|| ScanError::new("violation without an id"))?;
    let nodes = get(raw, "nodes");
    let nodes = nodes
        .dyn_ref::<Array>()
        .map(|nodes| nodes.iter().map(|n| parse_node(&n, dom)).collect())
        .unwrap_or_default();
    Ok(RuleViolation {
        id,
        help: get_string(raw, "help").unwrap_or_default(),
        help_url: get_string(raw, "helpUrl").unwrap_or_default(),
        description: get_string(raw, "description").unwrap_or_default(),
        impact: Impact::parse(get_string(raw, "impact").as_deref()),
        nodes,
    })
}

fn parse_node(raw: &JsValue, dom: &WebDom) -> NodeResult<NodeRef> {
    let element = get(raw, "element")
        .dyn_into::<Node>()
        .ok()
        .map(|n| dom.intern(&n));
    let target = get(raw, "target");
    let target = target
        .dyn_ref::<Array>()
        .map(|segments| segments.iter().filter_map(|s| parse_segment(&s)).collect())
        .unwrap_or_default();
    NodeResult {
        element,
        target,
        failure_summary: get_string(raw, "failureSummary"),
    }
}

fn parse_segment(raw: &JsValue) -> Option<TargetSegment> {
    if let Some(selector) = raw.as_string() {
        return Some(TargetSegment::Selector(selector));
    }
    let chain = raw.dyn_ref::<Array>()?;
    Some(TargetSegment::Shadow(
        chain.iter().filter_map(|s| s.as_string()).collect(),
    ))
}

fn node_array(dom: &WebDom, nodes: &[NodeRef]) -> Array {
    nodes.iter().filter_map(|&n| dom.node(n)).collect()
}

fn string_array<'a>(values: impl Iterator<Item = &'a str>) -> Array {
    values.map(JsValue::from_str).collect()
}

fn get(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn get_string(target: &JsValue, key: &str) -> Option<String> {
    get(target, key).as_string()
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), ScanError> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(drop)
        .map_err(|err| js_error("could not build the scan request", &err))
}

fn js_error(context: &str, err: &JsValue) -> ScanError {
    let detail = err
        .as_string()
        .or_else(|| get_string(err, "message"))
        .unwrap_or_else(|| String::from("unknown error"));
    ScanError::new(format!("{context}: {detail}"))
}
