/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

#![allow(clippy::upper_case_acronyms)]

use bitflags::bitflags;

/// `Paint Shop Pro Image File\n\x1a` padded with zeroes to 32 bytes
pub const PSP_SIGNATURE: [u8; 32] = *b"Paint Shop Pro Image File\n\x1a\0\0\0\0\0";

/// Number of leading signature bytes that must match.
///
/// Some writers put garbage in the padding.
pub const PSP_SIGNATURE_CHECK_LENGTH: usize = 27;

/// `~BK\0`
pub const PSP_BLOCK_IDENTIFIER: u32 = 0x004B_427E;
/// `~FL\0`
pub const PSP_FIELD_IDENTIFIER: u32 = 0x004C_467E;

/// Paint Shop Pro 5
pub const PSP_MAJOR_VERSION_5: u16 = 3;
/// Paint Shop Pro 6
pub const PSP_MAJOR_VERSION_6: u16 = 4;
/// Paint Shop Pro 7
pub const PSP_MAJOR_VERSION_7: u16 = 5;
/// Paint Shop Pro 8
pub const PSP_MAJOR_VERSION_8: u16 = 6;
/// Paint Shop Pro 9
pub const PSP_MAJOR_VERSION_9: u16 = 7;
/// Paint Shop Pro X
pub const PSP_MAJOR_VERSION_10: u16 = 8;
/// Paint Shop Pro X2
pub const PSP_MAJOR_VERSION_12: u16 = 10;

/// Block id of the thumbnail in version 5 files, it shares the
/// value of [`BlockId::CompositeImage`]
pub const PSP_V5_THUMBNAIL_BLOCK: u16 = 9;

/// Undocumented block written by Paint Shop Pro X2 and later
/// between a layer's info chunk and its bitmap info chunk
pub const PSP_X2_LAYER_MARKER_BLOCK: u16 = 0x21;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlockId {
    ImageAttributes = 0,
    Creator = 1,
    ColorPalette = 2,
    LayerStart = 3,
    Layer = 4,
    Channel = 5,
    Selection = 6,
    AlphaBank = 7,
    AlphaChannel = 8,
    CompositeImage = 9,
    ExtendedData = 10,
    PictureTube = 11,
    AdjustmentLayerExtension = 12,
    VectorLayerExtension = 13,
    VectorShape = 14,
    PaintStyle = 15,
    CompositeImageBank = 16,
    CompositeImageAttributes = 17,
    JPEGImage = 18,
    LineStyle = 19,
    TableBank = 20,
    Table = 21,
    Paper = 22,
    Pattern = 23,
    GroupLayerExtension = 24,
    MaskLayerExtension = 25,
    BrushData = 26
}

impl BlockId {
    pub fn from_int(int: u16) -> Option<BlockId> {
        use crate::constants::BlockId::*;

        match int {
            0 => Some(ImageAttributes),
            1 => Some(Creator),
            2 => Some(ColorPalette),
            3 => Some(LayerStart),
            4 => Some(Layer),
            5 => Some(Channel),
            6 => Some(Selection),
            7 => Some(AlphaBank),
            8 => Some(AlphaChannel),
            9 => Some(CompositeImage),
            10 => Some(ExtendedData),
            11 => Some(PictureTube),
            12 => Some(AdjustmentLayerExtension),
            13 => Some(VectorLayerExtension),
            14 => Some(VectorShape),
            15 => Some(PaintStyle),
            16 => Some(CompositeImageBank),
            17 => Some(CompositeImageAttributes),
            18 => Some(JPEGImage),
            19 => Some(LineStyle),
            20 => Some(TableBank),
            21 => Some(Table),
            22 => Some(Paper),
            23 => Some(Pattern),
            24 => Some(GroupLayerExtension),
            25 => Some(MaskLayerExtension),
            26 => Some(BrushData),
            _ => None
        }
    }
}

/// Role of a bitmap stored in a channel block
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DibType {
    Image = 0,
    TransparencyMask = 1,
    UserMask = 2,
    Selection = 3,
    AlphaMask = 4,
    Thumbnail = 5,
    ThumbnailTransparencyMask = 6,
    AdjustmentLayer = 7,
    Composite = 8,
    CompositeTransparencyMask = 9,
    Paper = 10,
    Pattern = 11,
    PatternTransparencyMask = 12
}

impl DibType {
    pub fn from_int(int: u16) -> Option<DibType> {
        use crate::constants::DibType::*;

        match int {
            0 => Some(Image),
            1 => Some(TransparencyMask),
            2 => Some(UserMask),
            3 => Some(Selection),
            4 => Some(AlphaMask),
            5 => Some(Thumbnail),
            6 => Some(ThumbnailTransparencyMask),
            7 => Some(AdjustmentLayer),
            8 => Some(Composite),
            9 => Some(CompositeTransparencyMask),
            10 => Some(Paper),
            11 => Some(Pattern),
            12 => Some(PatternTransparencyMask),
            _ => None
        }
    }
    /// Whether the plane carries color samples
    pub const fn is_color(self) -> bool {
        matches!(
            self,
            DibType::Image | DibType::Composite | DibType::Thumbnail
        )
    }
    /// Whether the plane carries the alpha of a color bitmap
    pub const fn is_transparency_mask(self) -> bool {
        matches!(
            self,
            DibType::TransparencyMask
                | DibType::CompositeTransparencyMask
                | DibType::ThumbnailTransparencyMask
        )
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChannelType {
    Composite = 0,
    Red = 1,
    Green = 2,
    Blue = 3
}

impl ChannelType {
    pub fn from_int(int: u16) -> Option<ChannelType> {
        match int {
            0 => Some(Self::Composite),
            1 => Some(Self::Red),
            2 => Some(Self::Green),
            3 => Some(Self::Blue),
            _ => None
        }
    }
}

/// Compression applied to channel data
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Compression {
    None = 0,
    RLE = 1,
    #[default]
    LZ77 = 2,
    JPEG = 3
}

impl Compression {
    pub fn from_int(int: u16) -> Option<Compression> {
        match int {
            0 => Some(Self::None),
            1 => Some(Self::RLE),
            2 => Some(Self::LZ77),
            3 => Some(Self::JPEG),
            _ => None
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LayerType {
    Undefined = 0,
    Raster = 1,
    FloatingRasterSelection = 2,
    Vector = 3,
    Adjustment = 4
}

impl LayerType {
    pub fn from_int(int: u8) -> Option<LayerType> {
        match int {
            0 => Some(Self::Undefined),
            1 => Some(Self::Raster),
            2 => Some(Self::FloatingRasterSelection),
            3 => Some(Self::Vector),
            4 => Some(Self::Adjustment),
            _ => None
        }
    }
    /// Raster and floating selection layers are the only
    /// kinds that store pixels
    pub const fn has_pixels(self) -> bool {
        matches!(self, LayerType::Raster | LayerType::FloatingRasterSelection)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum BlendMode {
    #[default]
    Normal = 0,
    Darken = 1,
    Lighten = 2,
    LegacyHue = 3,
    LegacySaturation = 4,
    Color = 5,
    LegacyLuminosity = 6,
    Multiply = 7,
    Screen = 8,
    Dissolve = 9,
    Overlay = 10,
    HardLight = 11,
    SoftLight = 12,
    Difference = 13,
    Dodge = 14,
    Burn = 15,
    Exclusion = 16,
    TrueHue = 17,
    TrueSaturation = 18,
    TrueColor = 19,
    TrueLightness = 20,
    Adjust = 255
}

impl BlendMode {
    pub fn from_int(int: u8) -> Option<BlendMode> {
        use crate::constants::BlendMode::*;

        match int {
            0 => Some(Normal),
            1 => Some(Darken),
            2 => Some(Lighten),
            3 => Some(LegacyHue),
            4 => Some(LegacySaturation),
            5 => Some(Color),
            6 => Some(LegacyLuminosity),
            7 => Some(Multiply),
            8 => Some(Screen),
            9 => Some(Dissolve),
            10 => Some(Overlay),
            11 => Some(HardLight),
            12 => Some(SoftLight),
            13 => Some(Difference),
            14 => Some(Dodge),
            15 => Some(Burn),
            16 => Some(Exclusion),
            17 => Some(TrueHue),
            18 => Some(TrueSaturation),
            19 => Some(TrueColor),
            20 => Some(TrueLightness),
            255 => Some(Adjust),
            _ => None
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ResolutionMetric {
    #[default]
    Undefined = 0,
    Inch = 1,
    Centimeter = 2
}

impl ResolutionMetric {
    pub fn from_int(int: u8) -> ResolutionMetric {
        match int {
            1 => Self::Inch,
            2 => Self::Centimeter,
            _ => Self::Undefined
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CreatorFieldId {
    Title = 0,
    CreateDate = 1,
    ModifiedDate = 2,
    Artist = 3,
    Copyright = 4,
    Description = 5,
    ApplicationId = 6,
    ApplicationVersion = 7
}

impl CreatorFieldId {
    pub fn from_int(int: u16) -> Option<CreatorFieldId> {
        use crate::constants::CreatorFieldId::*;

        match int {
            0 => Some(Title),
            1 => Some(CreateDate),
            2 => Some(ModifiedDate),
            3 => Some(Artist),
            4 => Some(Copyright),
            5 => Some(Description),
            6 => Some(ApplicationId),
            7 => Some(ApplicationVersion),
            _ => None
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ExtendedDataId {
    TransparencyIndex = 0,
    Grid = 1,
    Guide = 2
}

/// Role of an image inside the composite image bank
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CompositeImageType {
    Composite = 0,
    Thumbnail = 1
}

impl CompositeImageType {
    pub fn from_int(int: u16) -> Option<CompositeImageType> {
        match int {
            0 => Some(Self::Composite),
            1 => Some(Self::Thumbnail),
            _ => None
        }
    }
}

bitflags! {
    /// What kinds of graphics the file contains
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
    pub struct GraphicContents: u32 {
        const RASTER_LAYERS            = 0x0000_0001;
        const VECTOR_LAYERS            = 0x0000_0002;
        const ADJUSTMENT_LAYERS        = 0x0000_0004;
        const THUMBNAIL                = 0x0100_0000;
        const THUMBNAIL_TRANSPARENCY   = 0x0200_0000;
        const COMPOSITE                = 0x0400_0000;
        const COMPOSITE_TRANSPARENCY   = 0x0800_0000;
        const FLAT_IMAGE               = 0x1000_0000;
        const SELECTION                = 0x2000_0000;
        const FLOATING_SELECTION_LAYER = 0x4000_0000;
        const ALPHA_CHANNELS           = 0x8000_0000;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
    pub struct LayerFlags: u8 {
        const VISIBLE       = 0x01;
        const MASK_PRESENCE = 0x02;
    }
}
