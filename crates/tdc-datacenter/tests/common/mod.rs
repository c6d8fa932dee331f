//! Builds unpacked (and packed) Data Center buffers for tests.
#![allow(dead_code)]

use std::io::Write;

use cipher::generic_array::GenericArray;
use cipher::{BlockEncryptMut, KeyIvInit};
use flate2::write::ZlibEncoder;
use flate2::Compression;

pub const KEY: [u8; 16] = *b"tera-data-center";
pub const IV: [u8; 16] = *b"initial-vector!!";

#[derive(Debug, Clone)]
pub enum AttrValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub attributes: Vec<(String, AttrValue)>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.push((name.to_string(), value.into()));
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }
}

/// Lays a tree out the way the client file does.
///
/// Elements are numbered breadth-first so that every element's children are
/// consecutive; flat record `n` lands at coordinate `(n / per_bucket,
/// n % per_bucket)`. Each bucket gets `padding` unused slots after its
/// occupied ones.
#[derive(Debug, Clone)]
pub struct Builder {
    pub root: Node,
    pub elements_per_bucket: usize,
    pub attributes_per_bucket: usize,
    pub chars_per_bucket: usize,
    pub padding: usize,
    pub opaque_records: usize,
    pub header: [u32; 8],
}

impl Builder {
    pub fn new(root: Node) -> Self {
        Self {
            root,
            elements_per_bucket: 64,
            attributes_per_bucket: 64,
            chars_per_bucket: 256,
            padding: 0,
            opaque_records: 0,
            header: [0; 8],
        }
    }

    pub fn elements_per_bucket(mut self, n: usize) -> Self {
        self.elements_per_bucket = n;
        self
    }

    pub fn attributes_per_bucket(mut self, n: usize) -> Self {
        self.attributes_per_bucket = n;
        self
    }

    pub fn chars_per_bucket(mut self, n: usize) -> Self {
        self.chars_per_bucket = n;
        self
    }

    pub fn padding(mut self, n: usize) -> Self {
        self.padding = n;
        self
    }

    pub fn opaque_records(mut self, n: usize) -> Self {
        self.opaque_records = n;
        self
    }

    pub fn header(mut self, header: [u32; 8]) -> Self {
        self.header = header;
        self
    }

    /// Offset of the attributes region's bucket count.
    pub fn attributes_offset(&self) -> usize {
        32 + 4 + self.opaque_records * 8
    }

    pub fn build(&self) -> Vec<u8> {
        // Breadth-first element order.
        let mut order: Vec<&Node> = vec![&self.root];
        let mut first_child = Vec::new();
        let mut i = 0;
        while i < order.len() {
            let node = order[i];
            first_child.push(order.len());
            order.extend(node.children.iter());
            i += 1;
        }

        let mut names = StringPool::default();
        let mut values = StringPool::default();
        for node in &order {
            names.intern(&node.name);
            for (name, value) in &node.attributes {
                names.intern(name);
                if let AttrValue::Str(s) = value {
                    values.intern(s);
                }
            }
        }
        let value_chars = CharRegion::layout(&values.strings, self.chars_per_bucket);
        let name_chars = CharRegion::layout(&names.strings, usize::MAX);

        let mut attributes = Vec::new();
        let mut elements = Vec::new();
        for (n, node) in order.iter().enumerate() {
            let first_attribute = attributes.len();
            for (name, value) in &node.attributes {
                let mut record = names.index(name).to_le_bytes().to_vec();
                match value {
                    AttrValue::Int(v) => {
                        record.extend_from_slice(&1u16.to_le_bytes());
                        record.extend_from_slice(&v.to_le_bytes());
                    }
                    AttrValue::Float(v) => {
                        record.extend_from_slice(&2u16.to_le_bytes());
                        record.extend_from_slice(&v.to_le_bytes());
                    }
                    AttrValue::Bool(v) => {
                        record.extend_from_slice(&5u16.to_le_bytes());
                        record.extend_from_slice(&(*v as i32).to_le_bytes());
                    }
                    AttrValue::Str(s) => {
                        record.extend_from_slice(&3u16.to_le_bytes());
                        let (bucket, item) = value_chars.coordinates[values.position(s)];
                        record.extend_from_slice(&bucket.to_le_bytes());
                        record.extend_from_slice(&item.to_le_bytes());
                    }
                }
                attributes.push(record);
            }

            let mut record = names.index(&node.name).to_le_bytes().to_vec();
            record.extend_from_slice(&0u16.to_le_bytes());
            record.extend_from_slice(&(node.attributes.len() as u16).to_le_bytes());
            record.extend_from_slice(&(node.children.len() as u16).to_le_bytes());
            push_coordinate(&mut record, first_attribute, self.attributes_per_bucket);
            push_coordinate(&mut record, first_child[n], self.elements_per_bucket);
            elements.push(record);
        }

        let mut out = Vec::new();
        for word in self.header {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&(self.opaque_records as i32).to_le_bytes());
        out.extend(std::iter::repeat(0xCD).take(self.opaque_records * 8));

        write_record_region(&mut out, &attributes, 8, self.attributes_per_bucket, self.padding);
        write_record_region(&mut out, &elements, 16, self.elements_per_bucket, self.padding);

        value_chars.write(&mut out, self.padding);
        write_metadata(&mut out, 1024, &values.strings, &value_chars.coordinates);
        write_index_table(&mut out, &value_chars.coordinates);

        name_chars.write(&mut out, self.padding);
        write_metadata(&mut out, 512, &names.strings, &name_chars.coordinates);
        write_index_table(&mut out, &name_chars.coordinates);

        out
    }
}

#[derive(Default)]
struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    fn intern(&mut self, s: &str) {
        if !self.strings.iter().any(|x| x == s) {
            self.strings.push(s.to_string());
        }
    }

    fn position(&self, s: &str) -> usize {
        self.strings.iter().position(|x| x == s).unwrap()
    }

    /// 1-based, as stored in name fields.
    fn index(&self, s: &str) -> u16 {
        self.position(s) as u16 + 1
    }
}

struct CharRegion {
    buckets: Vec<Vec<u16>>,
    coordinates: Vec<(u16, u16)>,
}

impl CharRegion {
    /// Pack strings into buckets of up to `per_bucket` units. A string that
    /// does not fit starts a new bucket; a string longer than `per_bucket`
    /// gets a bucket of its own.
    fn layout(strings: &[String], per_bucket: usize) -> Self {
        let mut buckets: Vec<Vec<u16>> = vec![Vec::new()];
        let mut coordinates = Vec::new();

        for s in strings {
            let units: Vec<u16> = s.encode_utf16().chain(std::iter::once(0)).collect();
            let current = buckets.last().map_or(0, Vec::len);
            if current > 0 && current + units.len() > per_bucket {
                buckets.push(Vec::new());
            }
            let bucket = buckets.len() - 1;
            let item = buckets[bucket].len();
            coordinates.push((bucket as u16, item as u16));
            buckets[bucket].extend(units);
        }

        Self { buckets, coordinates }
    }

    fn write(&self, out: &mut Vec<u8>, padding: usize) {
        out.extend_from_slice(&(self.buckets.len() as i32).to_le_bytes());
        for bucket in &self.buckets {
            let capacity = (bucket.len() + padding).max(1);
            out.extend_from_slice(&(capacity as i32).to_le_bytes());
            out.extend_from_slice(&(bucket.len() as i32).to_le_bytes());
            for unit in bucket {
                out.extend_from_slice(&unit.to_le_bytes());
            }
            out.extend(std::iter::repeat(0).take((capacity - bucket.len()) * 2));
        }
    }
}

fn push_coordinate(record: &mut Vec<u8>, flat: usize, per_bucket: usize) {
    record.extend_from_slice(&((flat / per_bucket) as u16).to_le_bytes());
    record.extend_from_slice(&((flat % per_bucket) as u16).to_le_bytes());
}

fn write_record_region(out: &mut Vec<u8>, records: &[Vec<u8>], width: usize, per_bucket: usize, padding: usize) {
    if records.is_empty() {
        let capacity = padding.max(1);
        out.extend_from_slice(&1i32.to_le_bytes());
        out.extend_from_slice(&(capacity as i32).to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend(std::iter::repeat(0).take(capacity * width));
        return;
    }

    let chunks: Vec<_> = records.chunks(per_bucket).collect();
    out.extend_from_slice(&(chunks.len() as i32).to_le_bytes());
    for chunk in chunks {
        let capacity = chunk.len() + padding;
        out.extend_from_slice(&(capacity as i32).to_le_bytes());
        out.extend_from_slice(&(chunk.len() as i32).to_le_bytes());
        for record in chunk {
            assert_eq!(record.len(), width);
            out.extend_from_slice(record);
        }
        out.extend(std::iter::repeat(0).take(padding * width));
    }
}

/// All entries go into slot 0; the other slots are empty.
fn write_metadata(out: &mut Vec<u8>, slots: usize, strings: &[String], coordinates: &[(u16, u16)]) {
    out.extend_from_slice(&(strings.len() as i32).to_le_bytes());
    for (s, (bucket, item)) in strings.iter().zip(coordinates) {
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&(s.encode_utf16().count() as i32 + 1).to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&bucket.to_le_bytes());
        out.extend_from_slice(&item.to_le_bytes());
    }
    for _ in 1..slots {
        out.extend_from_slice(&0i32.to_le_bytes());
    }
}

fn write_index_table(out: &mut Vec<u8>, coordinates: &[(u16, u16)]) {
    out.extend_from_slice(&(coordinates.len() as i32 + 1).to_le_bytes());
    for (bucket, item) in coordinates {
        out.extend_from_slice(&bucket.to_le_bytes());
        out.extend_from_slice(&item.to_le_bytes());
    }
}

/// Compress and encrypt an unpacked buffer into the client's file format.
pub fn pack(unpacked: &[u8], key: &[u8; 16], iv: &[u8; 16]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(unpacked).unwrap();
    let zlib = encoder.finish().unwrap();

    let mut plain = (unpacked.len() as u32).to_le_bytes().to_vec();
    plain.extend_from_slice(&zlib);

    let mut cipher = cfb_mode::Encryptor::<aes::Aes128>::new(GenericArray::from_slice(key), GenericArray::from_slice(iv));
    let mut data = plain.clone();
    let tail = data.len() % 16;
    if tail != 0 {
        data.resize(data.len() + 16 - tail, 0);
    }
    for block in data.chunks_exact_mut(16) {
        cipher.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
    data.truncate(plain.len());
    data
}
