use super::*;
use crate::error::{ErrorCategory, ErrorCode};
use crate::export::encode_png;

#[test]
fn file_names_map_to_kinds() {
    assert_eq!(UploadKind::from_file_name("plan.pdf").unwrap(), UploadKind::Pdf);
    assert_eq!(UploadKind::from_file_name("scan.PNG").unwrap(), UploadKind::Png);
    assert_eq!(UploadKind::from_file_name("photo.jpg").unwrap(), UploadKind::Jpeg);
    assert_eq!(UploadKind::from_file_name("dir/photo.jpeg").unwrap(), UploadKind::Jpeg);
}

#[test]
fn unsupported_file_names_are_input_errors() {
    for name in ["notes.docx", "drawing.svg", "README"] {
        let err = UploadKind::from_file_name(name).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InputRejected);
        assert_eq!(err.error_code(), "E_UNSUPPORTED_UPLOAD");
    }
}

#[test]
fn mime_types_map_to_kinds() {
    assert_eq!(UploadKind::from_mime("application/pdf").unwrap(), UploadKind::Pdf);
    assert_eq!(UploadKind::from_mime("image/jpeg").unwrap(), UploadKind::Jpeg);
    assert!(UploadKind::from_mime("text/plain").is_err());
}

#[test]
fn only_pdf_is_paginated() {
    assert!(UploadKind::Pdf.is_paginated());
    assert!(!UploadKind::Png.is_paginated());
}

#[test]
fn image_rasterizer_decodes_png() {
    let raster = RasterImage::filled(3, 2, [5, 6, 7, 255]).unwrap();
    let png = encode_png(&raster).unwrap();
    let out = ImageRasterizer.render_first_page(UploadKind::Png, &png, 2.0).unwrap();
    assert_eq!(out, raster);
}

#[test]
fn image_rasterizer_rejects_garbage() {
    let err = ImageRasterizer.render_first_page(UploadKind::Jpeg, b"not a jpeg", 1.0).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InputRejected);
}

#[test]
fn image_rasterizer_has_no_pdf_support() {
    let err = ImageRasterizer.render_first_page(UploadKind::Pdf, b"%PDF-1.4", 2.0).unwrap_err();
    assert!(matches!(err, CanvasError::RasterizerUnavailable(_)));
    assert_eq!(err.category(), ErrorCategory::ResourceUnavailable);
}
