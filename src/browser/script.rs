//! ページに注入するJavaScriptの生成
//!
//! 要素の解決はすべてページ側で行い、結果はJSON文字列で返す。

use super::{ElementRef, Locator};
use serde::Serialize;

#[derive(Serialize)]
struct JsStep {
    kind: &'static str,
    value: &'static str,
    index: Option<usize>,
}

const RESOLVE_PRELUDE: &str = r#"
  const find = (ctx, step) => {
    if (step.kind === 'css') return Array.from(ctx.querySelectorAll(step.value));
    if (step.kind === 'id') {
      const el = document.getElementById(step.value);
      return el && (ctx === document || ctx.contains(el)) ? [el] : [];
    }
    const r = document.evaluate(step.value, ctx, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    const out = [];
    for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i));
    return out;
  };
  const resolve = (steps) => {
    let ctx = document;
    for (const step of steps) {
      const found = find(ctx, step);
      if (step.index === null) return found;
      if (step.index >= found.length) return null;
      ctx = found[step.index];
    }
    return ctx;
  };
"#;

const SNAPSHOT_FN: &str = r#"
  const snapshot = (el) => {
    const style = window.getComputedStyle(el);
    const visible = !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length)
      && style.visibility !== 'hidden';
    const attributes = {};
    for (const a of Array.from(el.attributes || [])) attributes[a.name] = a.value;
    if (typeof el.href === 'string' && el.href) attributes['href'] = el.href;
    if (typeof el.src === 'string' && el.src) attributes['src'] = el.src;
    return {
      text: ((el.innerText !== undefined ? el.innerText : el.textContent) || '').trim(),
      visible,
      enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true',
      attributes,
    };
  };
"#;

fn steps_json(scope: Option<&ElementRef>, last: Option<&Locator>) -> String {
    let mut steps: Vec<JsStep> = scope
        .map(|s| {
            s.steps()
                .iter()
                .map(|(l, i)| JsStep { kind: l.by.kind(), value: l.by.value(), index: Some(*i) })
                .collect()
        })
        .unwrap_or_default();
    if let Some(l) = last {
        steps.push(JsStep { kind: l.by.kind(), value: l.by.value(), index: None });
    }
    // JsStep は文字列と数値のみなので直列化は失敗しない
    serde_json::to_string(&steps).unwrap_or_else(|_| "[]".to_string())
}

/// 一致する要素のスナップショット配列をJSON文字列で返すスクリプト
pub fn query_script(scope: Option<&ElementRef>, locator: &Locator) -> String {
    format!(
        "(() => {{{}{}\n  const found = resolve({});\n  return JSON.stringify((found || []).map(snapshot));\n}})()",
        RESOLVE_PRELUDE,
        SNAPSHOT_FN,
        steps_json(scope, Some(locator))
    )
}

/// 要素に対する操作
#[derive(Debug, Clone)]
pub enum Action<'a> {
    Click,
    Type(&'a str),
}

/// 操作結果 `{"ok": bool, "error": string}` をJSON文字列で返すスクリプト
pub fn action_script(element: &ElementRef, action: &Action<'_>) -> String {
    let body = match action {
        Action::Click => "el.scrollIntoView({block: 'center'});\n  el.click();".to_string(),
        Action::Type(text) => format!(
            "el.focus();\n  el.value = {};\n  el.dispatchEvent(new Event('input', {{bubbles: true}}));\n  el.dispatchEvent(new Event('change', {{bubbles: true}}));",
            serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
        ),
    };
    format!(
        "(() => {{{}\n  const el = resolve({});\n  if (!el || el === document) return JSON.stringify({{ok: false, error: 'element detached'}});\n  {}\n  return JSON.stringify({{ok: true}});\n}})()",
        RESOLVE_PRELUDE,
        steps_json(Some(element), None),
        body
    )
}

pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight); true";
