fn main() {
    println!("cargo:rerun-if-changed=assets/logo.ico");

    #[cfg(target_os = "windows")]
    {
        let mut res = winres::WindowsResource::new();
        res.set_icon("assets/logo.ico")
            .set("ProductName", "Energía Eólica en Colombia")
            .set("FileDescription", "Wind-energy dashboard for Colombia");
        res.compile().expect("Failed to compile Windows resources");
    }
}
