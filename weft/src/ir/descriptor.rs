//! Minimal type-descriptor handling (`(ILjava/lang/String;)V`).

use compact_str::CompactString;
use smallvec::SmallVec;

/// A parsed method descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Parameter type descriptors, in order.
    pub params: SmallVec<[CompactString; 4]>,
    /// Return type descriptor (`V` for void).
    pub ret: CompactString,
}

impl MethodDescriptor {
    /// True if the method returns nothing.
    pub fn is_void(&self) -> bool {
        self.ret == "V"
    }
}

/// Returns the end offset of the field type starting at `start`, if valid.
fn field_type_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start;
    while bytes.get(pos) == Some(&b'[') {
        pos += 1;
    }
    match bytes.get(pos)? {
        b'Z' | b'B' | b'C' | b'S' | b'I' | b'J' | b'F' | b'D' => Some(pos + 1),
        b'L' => {
            let semi = bytes[pos..].iter().position(|b| *b == b';')?;
            // `L;` has no class name
            (semi > 1).then_some(pos + semi + 1)
        }
        _ => None,
    }
}

/// Parses a method descriptor. Returns `None` on malformed input.
pub fn parse_method_descriptor(desc: &str) -> Option<MethodDescriptor> {
    let bytes = desc.as_bytes();
    if bytes.first() != Some(&b'(') {
        return None;
    }
    let mut params = SmallVec::new();
    let mut pos = 1;
    while *bytes.get(pos)? != b')' {
        let end = field_type_end(bytes, pos)?;
        params.push(CompactString::from(&desc[pos..end]));
        pos = end;
    }
    pos += 1;
    let ret = if bytes.get(pos) == Some(&b'V') && pos + 1 == bytes.len() {
        CompactString::const_new("V")
    } else {
        let end = field_type_end(bytes, pos)?;
        if end != bytes.len() {
            return None;
        }
        CompactString::from(&desc[pos..])
    };
    Some(MethodDescriptor { params, ret })
}

/// True if `desc` is a single well-formed field type.
pub fn is_field_descriptor(desc: &str) -> bool {
    field_type_end(desc.as_bytes(), 0) == Some(desc.len())
}

/// Descriptor of the object type with the given internal name.
pub fn object_type(internal_name: &str) -> String {
    format!("L{internal_name};")
}

/// Replaces every reference to class `from` inside `desc` with class `to`.
pub fn replace_class(desc: &str, from: &str, to: &str) -> String {
    desc.replace(&object_type(from), &object_type(to))
}
