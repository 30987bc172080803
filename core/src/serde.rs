#[cfg(feature = "json")]
mod address {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use crate::identity::Address;

    /// Addresses (de)serialize as their textual form.
    impl Serialize for Address {
        fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            s.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D>(d: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(d)?;
            s.parse::<Address>().map_err(de::Error::custom)
        }
    }
}

/// Serde helper to (de)serialize Vec<u8> as UTF-8 strings.
#[cfg(feature = "json")]
pub mod utf8_serde {
    use std::str;

    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = str::from_utf8(bytes).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.into_bytes())
    }
}

/// Serde helper to (de)serialize `Vec<Vec<u8>>` as a list of hex strings.
#[cfg(feature = "json")]
pub mod hex_list_serde {
    use serde::ser::SerializeSeq;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&hex::encode(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| hex::decode(s.trim_start_matches("0x")).map_err(de::Error::custom))
            .collect()
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::{hex_list_serde, utf8_serde};
    use crate::identity::Address;

    #[test]
    fn address_valid_serde() {
        let addr = Address([9u8; 32]);
        let ser = serde_json::to_string(&addr).unwrap();
        assert_eq!(ser, format!("\"{}\"", addr));
        let de: Address = serde_json::from_str(&ser).unwrap();
        assert_eq!(de, addr);
    }

    #[test]
    fn address_invalid_serde() {
        assert!(serde_json::from_str::<Address>("\"0xdeadbeef\"").is_err());
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Utf8Wrapper(#[serde(with = "utf8_serde")] Vec<u8>);

    #[test]
    fn utf8_valid_serde() {
        let orig = b"coffee".to_vec();
        let wrapped = Utf8Wrapper(orig.clone());
        let ser = serde_json::to_string(&wrapped).unwrap();
        assert_eq!(ser, "\"coffee\"");
        let de: Utf8Wrapper = serde_json::from_str(&ser).unwrap();
        assert_eq!(de, wrapped);
    }

    #[test]
    fn utf8_invalid_serde() {
        let bad = Utf8Wrapper(vec![0xff, 0xfe]);
        assert!(serde_json::to_string(&bad).is_err());
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct ArgsWrapper(#[serde(with = "hex_list_serde")] Vec<Vec<u8>>);

    #[test]
    fn hex_list_serde_accepts_prefixed_items() {
        let de: ArgsWrapper = serde_json::from_str(r#"["0x7061", "00ff"]"#).unwrap();
        assert_eq!(de.0, vec![b"pa".to_vec(), vec![0x00, 0xff]]);
        assert_eq!(serde_json::to_string(&de).unwrap(), r#"["7061","00ff"]"#);
    }
}
