//! Ordered CoAP option lists
//!
//! CoAP transmits options in ascending option-number order and delta-encodes
//! the numbers between successive options, so the order of the staged list is
//! wire-significant. [`OptionList`] keeps its entries sorted by number at all
//! times and preserves insertion order among equal numbers, which is what
//! keeps repeated Uri-Path segments in their original left-to-right order.

use coap_lite::{CoapOption, Packet};

/// Uri-Host option number (RFC 7252)
pub const OPTION_URI_HOST: u16 = 3;
/// Uri-Port option number
pub const OPTION_URI_PORT: u16 = 7;
/// Uri-Path option number
pub const OPTION_URI_PATH: u16 = 11;
/// Uri-Query option number
pub const OPTION_URI_QUERY: u16 = 15;

/// A single staged option: numeric key plus opaque value bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    pub number: u16,
    pub value: Vec<u8>,
}

/// An ordered sequence of CoAP options
///
/// Invariant: entries are ascending by `number`; entries with equal numbers
/// appear in insertion order. The invariant is enforced by [`insert`], not by
/// caller discipline.
///
/// [`insert`]: OptionList::insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionList {
    entries: Vec<OptionEntry>,
}

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an option, keeping the list sorted and stable
    ///
    /// The new entry lands after every existing entry whose number is less
    /// than or equal to its own.
    pub fn insert(&mut self, number: u16, value: Vec<u8>) {
        let pos = self.entries.partition_point(|e| e.number <= number);
        self.entries.insert(pos, OptionEntry { number, value });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptionEntry> {
        self.entries.iter()
    }

    /// All values carried under one option number, in list order
    pub fn values_for(&self, number: u16) -> Vec<&[u8]> {
        self.entries
            .iter()
            .filter(|e| e.number == number)
            .map(|e| e.value.as_slice())
            .collect()
    }

    /// Copy the staged options onto a CoAP packet in list order
    pub fn apply_to(&self, pdu: &mut Packet) {
        for entry in &self.entries {
            pdu.add_option(CoapOption::from(entry.number), entry.value.clone());
        }
    }
}

impl<'a> IntoIterator for &'a OptionList {
    type Item = &'a OptionEntry;
    type IntoIter = std::slice::Iter<'a, OptionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Shortest big-endian encoding of a 16-bit value
///
/// CoAP uint option values drop leading zero bytes; zero encodes to the
/// empty string.
pub fn encode_u16_minimal(value: u16) -> Vec<u8> {
    if value == 0 {
        Vec::new()
    } else if value < 256 {
        vec![value as u8]
    } else {
        value.to_be_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_ascending_order() {
        let mut list = OptionList::new();
        list.insert(OPTION_URI_QUERY, b"ep=sensor1".to_vec());
        list.insert(OPTION_URI_PATH, b"rd".to_vec());
        list.insert(OPTION_URI_HOST, b"example.org".to_vec());

        let numbers: Vec<u16> = list.iter().map(|e| e.number).collect();
        assert_eq!(
            numbers,
            vec![OPTION_URI_HOST, OPTION_URI_PATH, OPTION_URI_QUERY]
        );
    }

    #[test]
    fn test_insert_is_stable_for_equal_numbers() {
        let mut list = OptionList::new();
        list.insert(OPTION_URI_PATH, b"a".to_vec());
        list.insert(OPTION_URI_PATH, b"b".to_vec());
        list.insert(OPTION_URI_PATH, b"c".to_vec());
        // a later, smaller-numbered option must not disturb the path order
        list.insert(OPTION_URI_PORT, encode_u16_minimal(61616));

        let paths = list.values_for(OPTION_URI_PATH);
        assert_eq!(paths, vec![b"a".as_slice(), b"b", b"c"]);

        let numbers: Vec<u16> = list.iter().map(|e| e.number).collect();
        assert_eq!(
            numbers,
            vec![
                OPTION_URI_PORT,
                OPTION_URI_PATH,
                OPTION_URI_PATH,
                OPTION_URI_PATH
            ]
        );
    }

    #[test]
    fn test_encode_u16_minimal() {
        assert_eq!(encode_u16_minimal(0), Vec::<u8>::new());
        assert_eq!(encode_u16_minimal(80), vec![80]);
        assert_eq!(encode_u16_minimal(255), vec![255]);
        assert_eq!(encode_u16_minimal(256), vec![1, 0]);
        assert_eq!(encode_u16_minimal(61616), vec![0xF0, 0xB0]);
    }

    #[test]
    fn test_apply_to_packet() {
        let mut list = OptionList::new();
        list.insert(OPTION_URI_PATH, b"rd".to_vec());
        list.insert(OPTION_URI_QUERY, b"ep=node1".to_vec());

        let mut pdu = Packet::new();
        list.apply_to(&mut pdu);

        let paths = pdu.get_option(CoapOption::UriPath).unwrap();
        assert_eq!(paths.front().unwrap().as_slice(), b"rd");
        let queries = pdu.get_option(CoapOption::UriQuery).unwrap();
        assert_eq!(queries.front().unwrap().as_slice(), b"ep=node1");
    }
}
