use weft_core::FakerKind;

fn main() {
    for kind in FakerKind::ALL {
        println!("{kind}");
    }
}
