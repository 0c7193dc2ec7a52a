pub mod overlay;

mod axes_draw;
