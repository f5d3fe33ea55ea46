use js_sys::{Float64Array, Object, Reflect, Uint32Array, Uint8Array};
use serde::Serialize;
use wasm_bindgen::JsValue;

use inkwarp::PathSet;

pub fn new_obj() -> Object { Object::new() }
pub fn set_kv(obj: &Object, k: &str, v: &JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(k), v);
}
pub fn arr_u32(slice: &[u32]) -> Uint32Array {
    let arr = Uint32Array::new_with_length(slice.len() as u32);
    arr.copy_from(slice); arr
}
pub fn arr_f64(slice: &[f64]) -> Float64Array {
    let arr = Float64Array::new_with_length(slice.len() as u32);
    arr.copy_from(slice); arr
}
pub fn arr_u8(slice: &[u8]) -> Uint8Array {
    let arr = Uint8Array::new_with_length(slice.len() as u32);
    arr.copy_from(slice); arr
}

/// Serialize to a plain JS value; unserializable input becomes `null`.
pub fn to_js<T: Serialize + ?Sized>(v: &T) -> JsValue {
    let ser = serde_wasm_bindgen::Serializer::json_compatible();
    v.serialize(&ser).unwrap_or(JsValue::NULL)
}

/// Flat typed arrays for drawing: `offsets[i]..offsets[i + 1]` indexes the
/// segments of path `i`, each segment being 8 coordinates
/// (`p1 cp1 cp2 p2`) in `coords`.
pub fn segment_arrays(paths: &PathSet) -> JsValue {
    let mut offsets = Vec::with_capacity(paths.len() + 1);
    let mut coords = Vec::with_capacity(paths.segment_count() * 8);
    let mut closed = Vec::with_capacity(paths.len());
    offsets.push(0u32);
    for p in paths {
        for s in &p.segments {
            coords.extend_from_slice(&[s.p1.x, s.p1.y, s.cp1.x, s.cp1.y, s.cp2.x, s.cp2.y, s.p2.x, s.p2.y]);
        }
        offsets.push((coords.len() / 8) as u32);
        closed.push(p.closed as u8);
    }
    let o = new_obj();
    set_kv(&o, "offsets", &arr_u32(&offsets).into());
    set_kv(&o, "coords", &arr_f64(&coords).into());
    set_kv(&o, "closed", &arr_u8(&closed).into());
    o.into()
}
