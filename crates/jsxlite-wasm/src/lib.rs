//! WASM bindings for the jsxlite compiler.
//!
//! Exposes `compile()`, `transform()`, `looksAlreadyCompiled()` and
//! `version()` to JavaScript via wasm-bindgen. Options are a plain object in
//! the camelCase shape of [`CompileOptions`]; errors are thrown as JS errors
//! whose message carries the line, column and source snippet.

use jsxlite_codegen::{looks_already_compiled, CompileError, CompileOptions};
use wasm_bindgen::prelude::*;

/// Compile markup-extended script to plain script.
///
/// `options` may be `undefined`/`null` for the defaults.
#[wasm_bindgen]
pub fn compile(source: &str, options: JsValue) -> Result<String, JsError> {
    let options = read_options(options)?;
    jsxlite_codegen::compile(source, &options).map_err(|e| JsError::new(&e.to_string()))
}

/// Compile unless the source already looks compiled.
///
/// Returns a JS object `{ code: string, skipped: boolean }`; when `skipped`
/// is true `code` is the input unchanged.
#[wasm_bindgen]
pub fn transform(source: &str, options: JsValue) -> Result<JsValue, JsError> {
    let options = read_options(options)?;
    let output = run_transform(source, &options).map_err(|e| JsError::new(&e.to_string()))?;

    let js_obj = js_sys::Object::new();
    js_sys::Reflect::set(&js_obj, &"code".into(), &output.code.into())
        .map_err(|_| JsError::new("Failed to set code property"))?;
    js_sys::Reflect::set(&js_obj, &"skipped".into(), &output.skipped.into())
        .map_err(|_| JsError::new("Failed to set skipped property"))?;

    Ok(js_obj.into())
}

/// Whether `source` is a single line of already-compiled output.
#[wasm_bindgen(js_name = looksAlreadyCompiled)]
pub fn looks_compiled(source: &str) -> bool {
    looks_already_compiled(source)
}

/// Get the compiler version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn read_options(options: JsValue) -> Result<CompileOptions, JsError> {
    if options.is_undefined() || options.is_null() {
        return Ok(CompileOptions::default());
    }
    serde_wasm_bindgen::from_value(options)
        .map_err(|e| JsError::new(&format!("Invalid compile options: {e}")))
}

struct TransformOutput {
    code: String,
    skipped: bool,
}

fn run_transform(source: &str, options: &CompileOptions) -> Result<TransformOutput, CompileError> {
    if looks_already_compiled(source) {
        return Ok(TransformOutput {
            code: source.to_string(),
            skipped: true,
        });
    }

    Ok(TransformOutput {
        code: jsxlite_codegen::compile(source, options)?,
        skipped: false,
    })
}
