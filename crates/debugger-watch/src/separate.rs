//! Out-of-line views of large values.
//!
//! Dumpers mark an item with an `editformat` such as `imagedata:separate` and
//! ship the payload hex-encoded in `editvalue`. This module decodes those
//! payloads into displayable content and keeps the set of open tabs, keyed by
//! [`WatchItem::key`]. Rendering is left to the host.

#![allow(missing_docs)]

use debugger_protocol::display_format::{
    DISPLAY_IMAGE_DATA, DISPLAY_IMAGE_FILE, DISPLAY_LATIN1_STRING, DISPLAY_PLOT_DATA,
    DISPLAY_UCS4_STRING, DISPLAY_UTF16_STRING, DISPLAY_UTF8_STRING,
};
use debugger_protocol::hex::decode_bytes;
use debugger_protocol::read_numeric_vector;
use tracing::{debug, warn};

use crate::error::EditValueError;
use crate::item::WatchItem;
use crate::settings::{Rect, SettingValue, SettingsStore, SEPARATE_GEOMETRY_KEY};

const IMAGE_HEADER_LEN: usize = 16;
const MIN_EXTENT: i32 = 200;

/// Decoded raster image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: i32,
    pub height: i32,
    pub nbytes: i32,
    /// Pixel format code as used by the inferior's image class.
    pub format: i32,
    pub pixels: Vec<u8>,
    /// One-line description shown above the image.
    pub info: String,
}

/// What a separated tab shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SeparatedContent {
    Image(ImageData),
    Text(String),
    Plot(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeparatedTab {
    pub key: String,
    pub title: String,
    pub iname: String,
    pub content: SeparatedContent,
}

/// Decodes the separated-view payload of `item`.
///
/// Returns `Ok(None)` when the item asks for no separated view.
pub fn decode_edit_value(item: &WatchItem) -> Result<Option<SeparatedContent>, EditValueError> {
    let format = item.edit_format.as_str();
    let content = match format {
        "" => return Ok(None),
        DISPLAY_IMAGE_DATA => SeparatedContent::Image(image_from_data(item)?),
        DISPLAY_IMAGE_FILE => SeparatedContent::Image(image_from_file(item)?),
        DISPLAY_LATIN1_STRING | DISPLAY_UTF8_STRING | DISPLAY_UTF16_STRING
        | DISPLAY_UCS4_STRING => {
            let bytes = decode_bytes(&item.edit_data)?;
            SeparatedContent::Text(decode_text(format, &bytes))
        }
        DISPLAY_PLOT_DATA => {
            let bytes = decode_bytes(&item.edit_data)?;
            SeparatedContent::Plot(read_numeric_vector(&bytes, &item.edit_encoding)?)
        }
        other => return Err(EditValueError::UnknownFormat(other.to_string())),
    };
    Ok(Some(content))
}

fn decode_text(format: &str, bytes: &[u8]) -> String {
    match format {
        DISPLAY_LATIN1_STRING => bytes.iter().copied().map(char::from).collect(),
        DISPLAY_UTF8_STRING => String::from_utf8_lossy(bytes).into_owned(),
        DISPLAY_UTF16_STRING => {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|unit| u16::from_le_bytes([unit[0], unit[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes
            .chunks_exact(4)
            .map(|unit| {
                char::from_u32(u32::from_le_bytes([unit[0], unit[1], unit[2], unit[3]]))
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            })
            .collect(),
    }
}

fn image_from_data(item: &WatchItem) -> Result<ImageData, EditValueError> {
    let mut bytes = decode_bytes(&item.edit_data)?;
    if bytes.len() <= IMAGE_HEADER_LEN {
        return Err(EditValueError::ShortImageHeader(bytes.len()));
    }
    // A zero low byte in the width means the header words arrived big-endian.
    if bytes[0] == 0 && bytes[1] == 0 {
        for word in bytes[..IMAGE_HEADER_LEN].chunks_exact_mut(4) {
            word.reverse();
        }
    }
    let field = |index: usize| {
        let at = index * 4;
        i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    };
    let (width, height, nbytes, format) = (field(0), field(1), field(2), field(3));
    let pixels = bytes.split_off(IMAGE_HEADER_LEN);
    build_image(item, width, height, nbytes, format, pixels)
}

fn image_from_file(item: &WatchItem) -> Result<ImageData, EditValueError> {
    let bad = || EditValueError::BadImageDescriptor(item.edit_data.clone());
    let mut fields = item.edit_data.split_whitespace();
    let mut number = || -> Result<i32, EditValueError> {
        fields.next().and_then(|field| field.parse().ok()).ok_or_else(bad)
    };
    let width = number()?;
    let height = number()?;
    let _reported = number()?;
    let format = number()?;
    let path = fields.next().ok_or_else(bad)?;
    let pixels = std::fs::read(path).map_err(|err| EditValueError::ImageFile {
        path: path.to_string(),
        message: err.to_string(),
    })?;
    build_image(item, width, height, width.saturating_mul(height), format, pixels)
}

fn build_image(
    item: &WatchItem,
    width: i32,
    height: i32,
    nbytes: i32,
    format: i32,
    mut pixels: Vec<u8>,
) -> Result<ImageData, EditValueError> {
    let in_range = (1..10_000).contains(&width)
        && (1..10_000).contains(&height)
        && (1..100_000_000).contains(&nbytes)
        && (1..32).contains(&format);
    if !in_range {
        return Err(EditValueError::ImageOutOfRange {
            width,
            height,
            nbytes,
            format,
        });
    }
    pixels.truncate(usize::try_from(nbytes).unwrap_or(0));
    let location = if item.address == 0 {
        "Unknown Address".to_string()
    } else {
        item.hex_address()
    };
    let info = format!(
        "{} Object at {location}    Size: {width}x{height}, {nbytes} byte, format: {format}",
        item.ty
    );
    Ok(ImageData {
        width,
        height,
        nbytes,
        format,
        pixels,
        info,
    })
}

/// Open separated tabs and the window geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeparatedView {
    tabs: Vec<SeparatedTab>,
    current: Option<usize>,
    geometry: Option<Rect>,
}

impl SeparatedView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the saved geometry, growing it to at least 200x200.
    pub fn restore_geometry(&mut self, settings: &dyn SettingsStore) {
        self.geometry = settings
            .value(SEPARATE_GEOMETRY_KEY)
            .and_then(|value| value.as_rect())
            .map(|rect| Rect {
                width: rect.width.max(MIN_EXTENT),
                height: rect.height.max(MIN_EXTENT),
                ..rect
            });
    }

    pub fn save_geometry(&self, settings: &mut dyn SettingsStore) {
        if let Some(rect) = self.geometry {
            settings.set_value(SEPARATE_GEOMETRY_KEY, SettingValue::Rect(rect));
        }
    }

    pub fn set_geometry(&mut self, rect: Rect) {
        self.geometry = Some(rect);
    }

    #[must_use]
    pub fn geometry(&self) -> Option<Rect> {
        self.geometry
    }

    /// The window is shown while any tab is open.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.tabs.is_empty()
    }

    #[must_use]
    pub fn tabs(&self) -> &[SeparatedTab] {
        &self.tabs
    }

    #[must_use]
    pub fn current(&self) -> Option<&SeparatedTab> {
        self.current.and_then(|index| self.tabs.get(index))
    }

    #[must_use]
    pub fn find(&self, key: &str) -> Option<&SeparatedTab> {
        self.tabs.iter().find(|tab| tab.key == key)
    }

    /// Updates the tab of `item` from its edit payload: opens or refreshes it
    /// when the item asks for a separated view, closes it otherwise.
    pub fn show_edit_value(
        &mut self,
        item: &WatchItem,
        settings: &mut dyn SettingsStore,
    ) -> Result<(), EditValueError> {
        match decode_edit_value(item)? {
            None => {
                let key = item.key();
                if self.find(&key).is_some() {
                    self.remove_object(&key, settings);
                }
                Ok(())
            }
            Some(content) => {
                self.prepare(item, content);
                Ok(())
            }
        }
    }

    fn prepare(&mut self, item: &WatchItem, content: SeparatedContent) {
        let key = item.key();
        let tab = SeparatedTab {
            key: key.clone(),
            title: item.name.clone(),
            iname: item.iname.clone(),
            content,
        };
        let index = if let Some(index) = self.tabs.iter().position(|tab| tab.key == key) {
            self.tabs[index] = tab;
            index
        } else {
            self.tabs.push(tab);
            self.tabs.len() - 1
        };
        debug!(%key, "separated view updated");
        self.current = Some(index);
    }

    /// Closes the tab showing `key`, if any.
    pub fn remove_object(&mut self, key: &str, settings: &mut dyn SettingsStore) {
        self.save_geometry(settings);
        if let Some(index) = self.tabs.iter().position(|tab| tab.key == key) {
            self.remove_tab(index);
        }
    }

    /// Closes a tab at the user's request. Returns the iname it showed, whose
    /// individual format the caller drops.
    pub fn close_tab(&mut self, index: usize, settings: &mut dyn SettingsStore) -> Option<String> {
        self.save_geometry(settings);
        if index >= self.tabs.len() {
            warn!(index, "no separated tab at index");
            return None;
        }
        Some(self.remove_tab(index).iname)
    }

    pub fn clear(&mut self) {
        self.tabs.clear();
        self.current = None;
    }

    fn remove_tab(&mut self, index: usize) -> SeparatedTab {
        let tab = self.tabs.remove(index);
        self.current = if self.tabs.is_empty() {
            None
        } else {
            Some(index.min(self.tabs.len() - 1))
        };
        tab
    }
}
