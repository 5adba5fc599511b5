// Metafile image formats
//
// - `emfplus`: EMF+ record stream decoding

pub mod emfplus;
