//! Decoding of BFlat bytes into [`Document`]s.

use crate::document::Document;
use crate::element::Records;
use crate::error::Result;

/// Decode a byte stream into a document. Records are read back to back until
/// the input is exhausted; the empty input is the empty document.
///
/// When several records share a tag name, their values are combined into one
/// sequence in record order (see [`Document::combine`]): a scalar record
/// contributes one element, an array record contributes all of its elements.
/// The combined sequence may mix element types even though each record's
/// array was homogeneous on the wire.
///
/// Any malformed record fails the whole call; nothing is skipped or
/// recovered, and no partial document is returned.
pub fn decode(data: &[u8]) -> Result<Document> {
    let mut doc = Document::new();
    for record in Records::new(data) {
        let record = record?;
        doc.combine(record.name, record.value);
    }
    Ok(doc)
}

#[cfg(test)]
mod test {
    use crate::{decode, encode, Document, Value};

    fn strings(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| Value::Str(v.to_string())).collect()
    }

    #[test]
    fn scalar_int_32() {
        let data = decode(b"\x2bfoo\x01\x00\x00\x00").unwrap();
        let mut expected = Document::new();
        expected.insert("foo", 1);
        assert_eq!(data, expected);
    }

    #[test]
    fn long_tag_name() {
        let data = decode(b"\x28\x19this is a longer tag name\x01\x00\x00\x00").unwrap();
        let mut expected = Document::new();
        expected.insert("this is a longer tag name", 1);
        assert_eq!(data, expected);
    }

    #[test]
    fn strings_document() {
        let test_data = b"\t0\x00\t1\x01\"\t2\x02zz\t3\x03zzz\t4\x04zzzz\t5\x07\x00\x01\x02dddd\t6\x06aa\xd0\x96aa\t7\x06aa\xd0\x96aa\t8\x03zzz\t9\x00";
        let data = decode(test_data).unwrap();
        let expected: Document = [
            ("0", ""),
            ("1", "\""),
            ("2", "zz"),
            ("3", "zzz"),
            ("4", "zzzz"),
            ("5", "\x00\x01\x02dddd"),
            ("6", "aa\u{0416}aa"),
            ("7", "aa\u{0416}aa"),
            ("8", "zzz"),
            ("9", ""),
        ]
        .into_iter()
        .collect();
        assert_eq!(data, expected);
    }

    #[cfg(not(feature = "bytes-as-string"))]
    #[test]
    fn binaries_document() {
        let test_data = b"\x110\x00\x111\x01\"\x112\x02zz\x113\x03zzz\x114\x04zzzz\x115\x07\x00\x01\x02dddd\x116\naa\\u0416aa\x117\naa\\u0416aa\x118\x06aa\x04\x16aa\x119\x03zzz\x1210\x00";
        let data = decode(test_data).unwrap();
        let expected: Document = [
            ("0", &b""[..]),
            ("1", &b"\""[..]),
            ("2", &b"zz"[..]),
            ("3", &b"zzz"[..]),
            ("4", &b"zzzz"[..]),
            ("5", &b"\x00\x01\x02dddd"[..]),
            ("6", &b"aa\\u0416aa"[..]),
            ("7", &b"aa\\u0416aa"[..]),
            ("8", &b"aa\x04\x16aa"[..]),
            ("9", &b"zzz"[..]),
            ("10", &b""[..]),
        ]
        .into_iter()
        .collect();
        assert_eq!(data, expected);
    }

    #[test]
    fn scalar_double_string_double() {
        let test_data = b"\x3edouble\xcd\xcc\xcc\xcc\xcc\xdc\x5e\x40\x08\x0flong string tag\x2cthe quick brown fox jumped over the lazy dog\x38\x0eanother double\x8f\xc2\xf5\x28\x5c\xff\x5e\xc0";
        let data = decode(test_data).unwrap();
        let expected: Document = [
            ("double", Value::F64(123.45)),
            (
                "long string tag",
                Value::Str("the quick brown fox jumped over the lazy dog".to_string()),
            ),
            ("another double", Value::F64(-123.99)),
        ]
        .into_iter()
        .collect();
        assert_eq!(data, expected);
    }

    #[test]
    fn leb128_array() {
        let test_data = b"\xceleb128\x09\x00\x7f\x01\x81\x7f\xff\x00\x80\x7f\x80\x01\x80\x80\x7c\x80\x80\x04";
        let data = decode(test_data).unwrap();
        let expected: Vec<Value> = [0i64, -1, 1, -127, 127, -128, 128, -65536, 65536]
            .into_iter()
            .map(Value::Int)
            .collect();
        assert_eq!(data.get("leb128"), Some(&Value::Array(expected)));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn string_array() {
        let test_data = b"\x8estring\x06\x00\x01a\x03aaa\x04aaaa\x01a\x00";
        let data = decode(test_data).unwrap();
        assert_eq!(
            data.get("string"),
            Some(&Value::Array(strings(&["", "a", "aaa", "aaaa", "a", ""])))
        );
    }

    #[cfg(not(feature = "bytes-as-string"))]
    #[test]
    fn binary_array() {
        let test_data = b"\x96binary\x06\x00\x01a\x03aaa\x04aaaa\x01a\x00";
        let data = decode(test_data).unwrap();
        let expected: Vec<Value> = [&b""[..], b"a", b"aaa", b"aaaa", b"a", b""]
            .into_iter()
            .map(|b| Value::Bin(b.to_vec()))
            .collect();
        assert_eq!(data.get("binary"), Some(&Value::Array(expected)));
    }

    #[cfg(feature = "bytes-as-string")]
    #[test]
    fn binary_array_as_strings() {
        let test_data = b"\x96binary\x06\x00\x01a\x03aaa\x04aaaa\x01a\x00";
        let data = decode(test_data).unwrap();
        assert_eq!(
            data.get("binary"),
            Some(&Value::Array(strings(&["", "a", "aaa", "aaaa", "a", ""])))
        );
    }

    #[test]
    fn null_string_double() {
        let test_data =
            b"\x04null\x08\x10string goes here\x01a\x3edouble\x73\x68\x91\xed\x7c\xff\x23\x40";
        let data = decode(test_data).unwrap();
        let expected: Document = [
            ("null", Value::Null),
            ("string goes here", Value::Str("a".to_string())),
            ("double", Value::F64(9.999)),
        ]
        .into_iter()
        .collect();
        assert_eq!(data, expected);
    }

    #[test]
    fn element_combining() {
        let scalar_1 = encode(&[("foo", Value::Int(1))].into_iter().collect()).unwrap();
        let scalar_2 = encode(
            &[("foo", Value::Str("bar".to_string()))]
                .into_iter()
                .collect(),
        )
        .unwrap();
        let array = encode(
            &[(
                "foo",
                Value::Array(vec![Value::F64(1.2), Value::F64(2.3), Value::F64(-3.4)]),
            )]
            .into_iter()
            .collect(),
        )
        .unwrap();

        let combined = |parts: &[&[u8]]| -> Document { decode(&parts.concat()).unwrap() };
        let expect = |elems: Vec<Value>| -> Document {
            let mut doc = Document::new();
            doc.insert("foo", Value::Array(elems));
            doc
        };

        assert_eq!(
            combined(&[&scalar_1, &scalar_2]),
            expect(vec![Value::Int(1), Value::Str("bar".to_string())])
        );
        assert_eq!(
            combined(&[&scalar_1, &array]),
            expect(vec![
                Value::Int(1),
                Value::F64(1.2),
                Value::F64(2.3),
                Value::F64(-3.4)
            ])
        );
        assert_eq!(
            combined(&[&scalar_2, &array]),
            expect(vec![
                Value::Str("bar".to_string()),
                Value::F64(1.2),
                Value::F64(2.3),
                Value::F64(-3.4)
            ])
        );
        assert_eq!(
            combined(&[&array, &scalar_1]),
            expect(vec![
                Value::F64(1.2),
                Value::F64(2.3),
                Value::F64(-3.4),
                Value::Int(1)
            ])
        );
        assert_eq!(
            combined(&[&array, &scalar_1, &scalar_2]),
            expect(vec![
                Value::F64(1.2),
                Value::F64(2.3),
                Value::F64(-3.4),
                Value::Int(1),
                Value::Str("bar".to_string())
            ])
        );
    }

    #[test]
    fn combined_keys_keep_first_position() {
        let mut first = Document::new();
        first.insert("a", 1);
        first.insert("b", 2);
        let mut second = Document::new();
        second.insert("a", 3);
        let mut bytes = encode(&first).unwrap();
        bytes.extend(encode(&second).unwrap());

        let data = decode(&bytes).unwrap();
        let names: Vec<&[u8]> = data.keys().collect();
        assert_eq!(names, [&b"a"[..], b"b"]);
        assert_eq!(
            data.get("a"),
            Some(&Value::Array(vec![Value::Int(1), Value::Int(3)]))
        );
    }

    #[test]
    fn empty_input() {
        let data = decode(b"").unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn empty_key_record() {
        // Hint 0 with an extended length of zero: an empty tag name.
        let data = decode(b"\x28\x00\x07\x00\x00\x00").unwrap();
        assert_eq!(data.get(b""), Some(&Value::Int(7)));
    }

    #[test]
    fn reencode_is_stable() {
        // Decoded documents re-encode to a stream that decodes identically,
        // even when the original used wire forms the encoder doesn't emit.
        let streams: [&[u8]; 4] = [
            // Int8 scalar + Int16 array.
            b"\x19a\x05\xa1b\x02\x01\x00\x02\x00",
            // Non-shortest LEB128 string length.
            b"\x09s\x81\x00a",
            // Int64 scalar that fits an i32.
            b"\x31a\x07\x00\x00\x00\x00\x00\x00\x00",
            // Combined duplicate keys.
            b"\x2bfoo\x01\x00\x00\x00\x2bfoo\x02\x00\x00\x00",
        ];
        for stream in streams {
            let first = decode(stream).unwrap();
            let reencoded = encode(&first).unwrap();
            let second = decode(&reencoded).unwrap();
            assert_eq!(first, second, "{:x?}", stream);
        }
    }

    #[test]
    fn truncation_fails_whole_call() {
        let mut doc = Document::new();
        doc.insert("name", "value");
        doc.insert("leb", Value::Array(vec![Value::Int(-65536)]));
        let bytes = encode(&doc).unwrap();
        assert!(decode(&bytes).is_ok());
        // Cutting anywhere inside the final record loses everything.
        for cut in bytes.len() - 4..bytes.len() {
            assert!(
                matches!(decode(&bytes[..cut]), Err(crate::Error::Truncated { .. })),
                "prefix of {} bytes",
                cut
            );
        }
    }

    #[test]
    fn unknown_type_fails_whole_call() {
        // A valid record followed by a datetime-coded one.
        let bytes = b"\x2bfoo\x01\x00\x00\x00\x41a\x00\x00\x00\x00\x00\x00\x00\x00";
        assert!(matches!(
            decode(bytes),
            Err(crate::Error::UnknownType { tag: 0x41 })
        ));
    }
}
