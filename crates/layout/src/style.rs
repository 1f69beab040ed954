//! The style view: a read-only, already-resolved accessor surface the
//! engine consumes but never constructs. Parsing and cascade happen
//! upstream of this crate entirely; by the time a `StyleView` reaches us
//! every property has already picked a winning declaration, inherited or
//! defaulted per the CSS cascade, and resolved any font- or
//! viewport-relative unit down to pixels. The one piece of "resolution"
//! that still happens inside the engine is percentage-against-containing-
//! block, because the containing block isn't known until layout runs.

use crate::pixels::CSSPixels;

/// A length that is either an absolute pixel value or a percentage still
/// waiting to be resolved against some containing-block dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LengthPercentage {
    Length(CSSPixels),
    Percentage(f32),
}

impl LengthPercentage {
    #[must_use]
    pub fn resolve_against(&self, base: CSSPixels) -> CSSPixels {
        match self {
            Self::Length(l) => *l,
            Self::Percentage(p) => base * *p,
        }
    }
}

/// `length | percentage | auto`, the vocabulary `spec.md` §3 uses for
/// margins, widths and heights.
pub type LengthPercentageAuto = crate::pixels::AutoOr<LengthPercentage>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Display {
    None,
    #[default]
    Inline,
    Block,
    InlineBlock,
    ListItem,
    Table,
    TableRowGroup,
    TableHeaderGroup,
    TableFooterGroup,
    TableRow,
    TableCell,
    TableColumn,
    TableColumnGroup,
    TableCaption,
    Flex,
    InlineFlex,
    Grid,
    InlineGrid,
    /// An unrecognized `display` value. §7: treated as `Block`.
    Unknown,
}

impl Display {
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub const fn is_inline_level(&self) -> bool {
        matches!(self, Self::Inline | Self::InlineBlock | Self::InlineFlex | Self::InlineGrid)
    }

    /// The effective display after §4.1 step 1's `display:inline` ->
    /// `block` coercion for floated / absolutely positioned / replaced
    /// elements, and after §7's "unknown display" fallback.
    #[must_use]
    pub fn blockify(self) -> Self {
        match self {
            Self::Inline => Self::Block,
            Self::Unknown => Self::Block,
            other => other,
        }
    }

    #[must_use]
    pub const fn is_table_part(&self) -> bool {
        matches!(
            self,
            Self::Table
                | Self::TableRowGroup
                | Self::TableHeaderGroup
                | Self::TableFooterGroup
                | Self::TableRow
                | Self::TableCell
                | Self::TableColumn
                | Self::TableColumnGroup
                | Self::TableCaption
        )
    }

    #[must_use]
    pub const fn is_flex(&self) -> bool {
        matches!(self, Self::Flex | Self::InlineFlex)
    }

    #[must_use]
    pub const fn is_grid(&self) -> bool {
        matches!(self, Self::Grid | Self::InlineGrid)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
}

impl Position {
    #[must_use]
    pub const fn is_static(&self) -> bool {
        matches!(self, Self::Static)
    }

    #[must_use]
    pub const fn is_absolutely_positioned(&self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }

    /// Whether a box with this position establishes itself as a
    /// "positioned ancestor" that `position: absolute` descendants may
    /// resolve their containing block against.
    #[must_use]
    pub const fn is_positioned(&self) -> bool {
        !self.is_static()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Float {
    #[default]
    None,
    Left,
    Right,
}

impl Float {
    #[must_use]
    pub const fn side(&self) -> Option<FloatSide> {
        match self {
            Self::None => None,
            Self::Left => Some(FloatSide::Left),
            Self::Right => Some(FloatSide::Right),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatSide {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Clear {
    #[default]
    None,
    Left,
    Right,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
    Auto,
}

impl Overflow {
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self, Self::Visible)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// `box-sizing`, a [FULL-ADD] completing the width/height resolution
/// steps `spec.md` §4.1 leaves implicit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BoxSizing {
    #[default]
    ContentBox,
    BorderBox,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WhiteSpace {
    #[default]
    Normal,
    NoWrap,
    Pre,
    PreWrap,
    PreLine,
}

impl WhiteSpace {
    #[must_use]
    pub const fn collapses_whitespace(&self) -> bool {
        matches!(self, Self::Normal | Self::NoWrap)
    }

    #[must_use]
    pub const fn wraps(&self) -> bool {
        !matches!(self, Self::NoWrap | Self::Pre)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum VerticalAlign {
    #[default]
    Baseline,
    Top,
    Middle,
    Bottom,
    TextTop,
    TextBottom,
    Sub,
    Super,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// <https://drafts.csswg.org/css-counter-styles-3/#typedef-counter-style-name>
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ListStyleType {
    #[default]
    Disc,
    Circle,
    Square,
    Decimal,
    Custom(String),
    None,
}

impl ListStyleType {
    /// The literal marker text for styles that don't depend on a counter
    /// value (everything except `Decimal`, which needs the item's ordinal).
    #[must_use]
    pub fn static_marker(&self) -> Option<&str> {
        match self {
            Self::Disc => Some("\u{2022}"),
            Self::Circle => Some("\u{25E6}"),
            Self::Square => Some("\u{25AA}"),
            Self::Custom(s) => Some(s.as_str()),
            Self::Decimal => None,
            Self::None => None,
        }
    }
}

/// One atom of a parsed `content` property value, per `spec.md` §3.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentAtom {
    Literal(String),
    Url(String),
    Counter(String),
    Attr(String),
    OpenQuote,
    CloseQuote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZIndex {
    Auto,
    Value(i32),
}

impl ZIndex {
    #[must_use]
    pub const fn value(&self) -> Option<i32> {
        match self {
            Self::Auto => None,
            Self::Value(v) => Some(*v),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FlexDirection {
    #[default]
    Row,
    RowReverse,
    Column,
    ColumnReverse,
}

impl FlexDirection {
    #[must_use]
    pub const fn is_row(&self) -> bool {
        matches!(self, Self::Row | Self::RowReverse)
    }

    #[must_use]
    pub const fn is_reversed(&self) -> bool {
        matches!(self, Self::RowReverse | Self::ColumnReverse)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FlexWrap {
    #[default]
    NoWrap,
    Wrap,
    WrapReverse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JustifyContent {
    #[default]
    FlexStart,
    FlexEnd,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AlignItems {
    #[default]
    Stretch,
    FlexStart,
    FlexEnd,
    Center,
    Baseline,
}

/// `align-self: auto` defers to the item's own `align-items`;
/// everything else overrides it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AlignSelf {
    #[default]
    Auto,
    Stretch,
    FlexStart,
    FlexEnd,
    Center,
    Baseline,
}

/// Typed, already-resolved view of one element's computed style.
///
/// Implementors must tolerate properties the upstream cascade never set
/// (return the CSS initial value, per `spec.md` §6) — this trait never
/// returns `Option` for a property that has a well-defined initial value;
/// only properties that are meaningfully *absent* (offsets, z-index,
/// max-width/height, explicit width/height) use `Option`/`AutoOr`.
pub trait StyleView {
    fn display(&self) -> Display;
    fn position(&self) -> Position;
    fn float(&self) -> Float;
    fn clear(&self) -> Clear;
    fn overflow(&self) -> Overflow;
    fn visibility(&self) -> Visibility {
        Visibility::Visible
    }
    fn box_sizing(&self) -> BoxSizing {
        BoxSizing::ContentBox
    }
    fn direction(&self) -> Direction {
        Direction::Ltr
    }

    fn margin_top(&self) -> LengthPercentageAuto;
    fn margin_right(&self) -> LengthPercentageAuto;
    fn margin_bottom(&self) -> LengthPercentageAuto;
    fn margin_left(&self) -> LengthPercentageAuto;

    fn padding_top(&self) -> LengthPercentage;
    fn padding_right(&self) -> LengthPercentage;
    fn padding_bottom(&self) -> LengthPercentage;
    fn padding_left(&self) -> LengthPercentage;

    fn border_top_width(&self) -> CSSPixels;
    fn border_right_width(&self) -> CSSPixels;
    fn border_bottom_width(&self) -> CSSPixels;
    fn border_left_width(&self) -> CSSPixels;

    fn width(&self) -> LengthPercentageAuto;
    fn height(&self) -> LengthPercentageAuto;
    fn min_width(&self) -> Option<LengthPercentage> {
        None
    }
    fn max_width(&self) -> Option<LengthPercentage> {
        None
    }
    fn min_height(&self) -> Option<LengthPercentage> {
        None
    }
    fn max_height(&self) -> Option<LengthPercentage> {
        None
    }

    /// `None` means the offset is not specified (the CSS initial value
    /// `auto`), matching `spec.md` §3's "each absent or length".
    fn top(&self) -> Option<LengthPercentage> {
        None
    }
    fn right(&self) -> Option<LengthPercentage> {
        None
    }
    fn bottom(&self) -> Option<LengthPercentage> {
        None
    }
    fn left(&self) -> Option<LengthPercentage> {
        None
    }

    fn z_index(&self) -> ZIndex {
        ZIndex::Auto
    }

    fn font_size(&self) -> CSSPixels;
    fn font_bold(&self) -> bool {
        false
    }
    /// `None` means `line-height: normal`; the caller should ask the
    /// measurement oracle for the font's natural line height instead.
    fn line_height(&self) -> Option<CSSPixels> {
        None
    }
    fn vertical_align(&self) -> VerticalAlign {
        VerticalAlign::Baseline
    }
    fn text_align(&self) -> TextAlign {
        TextAlign::Left
    }
    fn white_space(&self) -> WhiteSpace {
        WhiteSpace::Normal
    }

    fn list_style_type(&self) -> ListStyleType {
        ListStyleType::Disc
    }
    fn counter_reset(&self) -> Vec<(String, i32)> {
        Vec::new()
    }
    fn counter_increment(&self) -> Vec<(String, i32)> {
        Vec::new()
    }

    /// `None` means no `content` was specified (no pseudo-element is
    /// generated, even if `::before`/`::after` otherwise matched).
    fn content(&self) -> Option<Vec<ContentAtom>> {
        None
    }

    fn opacity(&self) -> f32 {
        1.0
    }
    fn has_transform(&self) -> bool {
        false
    }

    fn flex_direction(&self) -> FlexDirection {
        FlexDirection::Row
    }
    fn flex_wrap(&self) -> FlexWrap {
        FlexWrap::NoWrap
    }
    fn justify_content(&self) -> JustifyContent {
        JustifyContent::FlexStart
    }
    fn align_items(&self) -> AlignItems {
        AlignItems::Stretch
    }
    fn align_self(&self) -> AlignSelf {
        AlignSelf::Auto
    }
    fn order(&self) -> i32 {
        0
    }
    fn flex_grow(&self) -> f32 {
        0.0
    }
    fn flex_shrink(&self) -> f32 {
        1.0
    }
    /// `None` means `flex-basis: auto` (defer to `width`/`height`).
    fn flex_basis(&self) -> Option<LengthPercentage> {
        None
    }

    /// Table-only: `border-spacing`, horizontal and vertical.
    fn border_spacing(&self) -> (CSSPixels, CSSPixels) {
        (CSSPixels::ZERO, CSSPixels::ZERO)
    }

    /// Table cell / row span attributes are exposed through style here
    /// for convenience, mirroring how the reference resolves them (HTML
    /// presentational attributes become part of the style view in every
    /// CSS UA stylesheet implementation) rather than re-reading the DOM
    /// attribute map inside the table algorithm.
    fn row_span(&self) -> u32 {
        1
    }
    fn col_span(&self) -> u32 {
        1
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedEdges<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

/// Resolve the four border widths from a style view, zeroing any edge
/// whose `border-style` is unset is the implementor's job (the trait only
/// hands back the *used* width, already zeroed for `border-style: none`
/// by the cascade — see `StyleView::border_*_width` doc).
#[must_use]
pub fn used_border_widths(style: &dyn StyleView) -> crate::pixels::Sides<CSSPixels> {
    crate::pixels::Sides {
        top: style.border_top_width(),
        right: style.border_right_width(),
        bottom: style.border_bottom_width(),
        left: style.border_left_width(),
    }
}
